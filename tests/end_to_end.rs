use padbridge::bridge::Running;
use padbridge::controller::{Buttons, RawPadState, ScriptedSource, StickVector};
use padbridge::host::{EntityId, EntityRef, PlacementHost, Point, PointerHost, Size};
use padbridge::mapping::remap::FacePosition;
use padbridge::mapping::{ControlStyle, ControllerLayout, RemapContext};
use padbridge::screen::placement::PlacementMode;
use padbridge::screen::{ScreenId, ScreenKind, SubState};
use padbridge::{BridgeConfig, HostError, InputBridge};

#[derive(Default)]
struct RecordingHost {
    attempts: Vec<Point>,
    pointer_moves: usize,
    origin: (i32, i32),
}

impl PointerHost for RecordingHost {
    fn hover_pointer(&mut self, _at: Point) {
        self.pointer_moves += 1;
    }

    fn pan_viewport(&mut self, dx: i32, dy: i32) -> (i32, i32) {
        self.origin = (self.origin.0 + dx, self.origin.1 + dy);
        (dx, dy)
    }

    fn viewport_origin(&self) -> (i32, i32) {
        self.origin
    }

    fn viewport_size(&self) -> Size {
        Size::new(1280.0, 720.0)
    }

    fn display_scale(&self) -> f32 {
        1.0
    }

    fn preview_extent(&self) -> Option<Size> {
        None
    }
}

impl PlacementHost for RecordingHost {
    fn attempt_placement(&mut self, at: Point) -> Result<(), HostError> {
        self.attempts.push(at);
        Ok(())
    }

    fn select_entity_at(&mut self, _at: Point) -> Option<EntityRef> {
        None
    }

    fn entity_at(&self, _at: Point) -> Option<EntityRef> {
        None
    }

    fn entity_exists(&self, _id: EntityId) -> bool {
        false
    }

    fn reanchor_preview(&mut self, _id: EntityId, _at: Point) -> Result<(), HostError> {
        Ok(())
    }

    fn confirm_move(&mut self, _id: EntityId, _at: Point) -> Result<(), HostError> {
        Ok(())
    }

    fn confirm_demolish(&mut self, _id: EntityId) -> Result<(), HostError> {
        Ok(())
    }

    fn exit_placement(&mut self) {}
}

fn bridge_with(config: BridgeConfig, script: ScriptedSource) -> InputBridge<Running> {
    InputBridge::create(config).attach(Box::new(script))
}

fn buttons(buttons: Buttons) -> RawPadState {
    RawPadState {
        buttons,
        ..Default::default()
    }
}

fn stick_right() -> RawPadState {
    RawPadState {
        left_stick: StickVector::new(1.0, 0.0),
        ..Default::default()
    }
}

#[test]
fn bottom_button_confirms_for_primary_layout_with_style_b() {
    let config = BridgeConfig {
        layout: ControllerLayout::Primary,
        style: ControlStyle::StyleB,
        ..BridgeConfig::default()
    };
    let bottom = ControllerLayout::Primary.code_at(FacePosition::South);

    let mut script = ScriptedSource::new();
    script.push(buttons(bottom));
    let mut bridge = bridge_with(config, script);

    for context in [RemapContext::Title, RemapContext::Menu, RemapContext::Gameplay] {
        bridge.set_context(context);
        bridge.begin_tick();
        let snapshot = bridge.snapshot();
        assert!(snapshot.is_pressed(Buttons::CONFIRM), "{context:?}");
        assert!(!snapshot.is_pressed(Buttons::CANCEL), "{context:?}");
        assert_eq!(snapshot.physical, bottom);
    }
}

#[test]
fn held_stick_then_confirm_places_once_at_accumulated_position() {
    const TICKS: usize = 20;
    let config = BridgeConfig::default();
    let speed = config.cursor.max_speed;

    let mut script = ScriptedSource::new();
    script
        .push_repeated(stick_right(), TICKS)
        .push_repeated(buttons(Buttons::CONFIRM), 3)
        .push(RawPadState::default());
    let mut bridge = bridge_with(config, script);
    let mut host = RecordingHost::default();

    let screen = ScreenId(7);
    bridge.on_screen_opened(screen, ScreenKind::Placement(PlacementMode::Build));
    bridge.on_sub_state_changed(screen, SubState::Spatial);

    for _ in 0..TICKS + 4 {
        bridge.begin_tick();
        // Update and draw callbacks both reach the bridge every frame.
        bridge.update(&mut host);
        bridge.update(&mut host);
    }

    assert_eq!(host.attempts.len(), 1, "attempts: {:?}", host.attempts);
    let expected = Point::new(640.0 + speed * TICKS as f32, 360.0);
    let at = host.attempts[0];
    assert!((at.x - expected.x).abs() <= 1.0, "x {} vs {}", at.x, expected.x);
    assert!((at.y - expected.y).abs() <= 1.0, "y {} vs {}", at.y, expected.y);
    assert_eq!(host.pointer_moves, TICKS);
}

#[test]
fn separate_confirm_presses_each_attempt_placement() {
    let mut script = ScriptedSource::new();
    script
        .push(buttons(Buttons::CONFIRM))
        .push(RawPadState::default())
        .push(buttons(Buttons::CONFIRM))
        .push(RawPadState::default());
    let mut bridge = bridge_with(BridgeConfig::default(), script);
    let mut host = RecordingHost::default();

    let screen = ScreenId(1);
    bridge.on_screen_opened(screen, ScreenKind::Placement(PlacementMode::Build));
    bridge.on_sub_state_changed(screen, SubState::Spatial);
    for _ in 0..4 {
        bridge.begin_tick();
        bridge.update(&mut host);
    }
    assert_eq!(host.attempts, vec![Point::new(640.0, 360.0); 2]);
}

#[test]
fn snapshot_is_identical_across_call_sites() {
    let mut script = ScriptedSource::new();
    script.push(RawPadState {
        buttons: Buttons::X | Buttons::START,
        right_stick: StickVector::new(-0.4, 0.9),
        right_trigger: 0.7,
        ..Default::default()
    });
    let mut bridge = bridge_with(BridgeConfig::default(), script);
    let cache = bridge.cache();

    bridge.begin_tick();
    let first = bridge.snapshot();
    for _ in 0..25 {
        assert_eq!(bridge.snapshot(), first);
        assert_eq!(cache.query(), first);
    }
    assert_eq!(cache.computations(), 1);
    assert!(first.menu_just_pressed());
}

#[test]
fn consumed_confirm_is_hidden_from_the_host_until_released() {
    let mut script = ScriptedSource::new();
    script
        .push(buttons(Buttons::CONFIRM))
        .push(buttons(Buttons::CONFIRM))
        .push(RawPadState::default());
    let mut bridge = bridge_with(BridgeConfig::default(), script);
    let mut host = RecordingHost::default();

    let screen = ScreenId(3);
    bridge.on_screen_opened(screen, ScreenKind::Placement(PlacementMode::Build));
    bridge.on_sub_state_changed(screen, SubState::Spatial);

    bridge.begin_tick();
    assert!(bridge.snapshot().just_pressed(Buttons::CONFIRM));
    let update = bridge.update(&mut host);
    assert_eq!(update.consumed, Buttons::CONFIRM);
    // Later readers in the same tick see the press gone.
    assert!(!bridge.snapshot().is_pressed(Buttons::CONFIRM));

    bridge.begin_tick();
    assert!(!bridge.snapshot().is_pressed(Buttons::CONFIRM));

    bridge.begin_tick();
    assert!(!bridge.cache().is_suppressed(Buttons::CONFIRM));
    assert_eq!(host.attempts.len(), 1);
}

#[test]
fn held_start_fires_once_while_confirm_is_consumed() {
    let held = buttons(Buttons::CONFIRM | Buttons::START);
    let mut script = ScriptedSource::new();
    script.push_repeated(held, 3);
    let mut bridge = bridge_with(BridgeConfig::default(), script);
    let mut host = RecordingHost::default();

    let screen = ScreenId(4);
    bridge.on_screen_opened(screen, ScreenKind::Placement(PlacementMode::Build));
    bridge.on_sub_state_changed(screen, SubState::Spatial);

    let mut menu_edges = Vec::new();
    for _ in 0..3 {
        bridge.begin_tick();
        menu_edges.push(bridge.snapshot().menu_just_pressed());
        bridge.update(&mut host);
    }
    assert_eq!(menu_edges, vec![true, false, false]);
    assert_eq!(host.attempts.len(), 1);
}

#[test]
fn suppressed_secondary_button_stays_hidden_across_context_swaps() {
    let config = BridgeConfig {
        layout: ControllerLayout::Primary,
        style: ControlStyle::StyleA,
        ..BridgeConfig::default()
    };
    let mut script = ScriptedSource::new();
    script
        .push_repeated(buttons(Buttons::X), 3)
        .push(RawPadState::default())
        .push(buttons(Buttons::X));
    let mut bridge = bridge_with(config, script);

    // Gameplay swaps the secondary pair for the primary layout.
    bridge.set_context(RemapContext::Gameplay);
    bridge.begin_tick();
    assert!(bridge.snapshot().just_pressed(Buttons::Y));
    bridge.suppress(Buttons::Y);

    bridge.set_context(RemapContext::Menu);
    bridge.begin_tick();
    assert!(!bridge.snapshot().is_pressed(Buttons::X));

    bridge.set_context(RemapContext::Gameplay);
    bridge.begin_tick();
    let back = bridge.snapshot();
    assert!(!back.is_pressed(Buttons::Y));
    assert!(back.newly_pressed.is_empty());

    bridge.begin_tick();
    assert!(bridge.snapshot().buttons.is_empty());

    bridge.begin_tick();
    assert!(bridge.snapshot().just_pressed(Buttons::Y));
}
