//! Per-tick execution of the actions attached to characters.
//!
//! Each character holds at most one [`ActiveAction`]. Every tick, before
//! movement is integrated, the executor looks at that action and either
//! keeps approaching the target, applies the effect, or drops the action.
//! Targets removed earlier in the same tick are treated as gone even though
//! they remain in the registry until compaction.

use realm_types::{Action, MovementState, NetworkId, ProgressEventKind, SessionId, Vec2};
use tracing::debug;

use super::ActionEffect;
use crate::area::Area;
use crate::entity::{ActiveAction, AreaLinkData, Character, Entity};
use crate::navigator::Navigator;

/// What the executor decided for one character this tick.
enum Step {
    /// Keep the action attached.
    Continue(ActiveAction),
    /// The action finished or was abandoned.
    Done,
}

/// Target state read before the actor is mutated.
struct TargetView {
    id: NetworkId,
    name: String,
    position: Vec2,
    dialog: Option<String>,
    health: Option<u32>,
    link: Option<AreaLinkData>,
}

impl TargetView {
    fn read(entity: &Entity, id: NetworkId) -> Self {
        Self {
            id,
            name: entity.name.clone(),
            position: entity.position,
            dialog: entity.dialog.clone(),
            health: entity.health,
            link: entity.link().cloned(),
        }
    }
}

/// Advance the attached action of every live character in `area`.
pub fn step_actions(area: &mut Area) -> Vec<ActionEffect> {
    let navigator = area.navigator_handle();
    let mut effects = Vec::new();

    for id in area.registry().character_ids() {
        let Some(entity) = area.registry_mut().get_by_id_mut(id) else {
            continue;
        };
        // Killed earlier this tick.
        if entity.is_removed() {
            continue;
        }
        let owner = entity.owner;
        let Some(active) = entity.character_mut().and_then(Character::take_action) else {
            continue;
        };

        let step = match active.action {
            Action::Move { destination } => step_move(area, id, active, destination, navigator.as_ref()),
            Action::Talk { target }
            | Action::Attack { target }
            | Action::AreaLink { target }
            | Action::Configure { target } => {
                step_targeted(area, id, owner, active, target, navigator.as_ref(), &mut effects)
            }
            // Resolved at dispatch; never attached.
            Action::Option { .. } | Action::Close { .. } => Step::Done,
        };

        if let Step::Continue(active) = step
            && let Some(character) = area
                .registry_mut()
                .get_by_id_mut(id)
                .and_then(Entity::character_mut)
        {
            character.attach_action(active);
        }
    }

    effects
}

fn step_move(
    area: &mut Area,
    id: NetworkId,
    mut active: ActiveAction,
    destination: Vec2,
    navigator: &dyn Navigator,
) -> Step {
    let Some(entity) = area.registry_mut().get_by_id_mut(id) else {
        return Step::Done;
    };
    let position = entity.position;
    let Some(character) = entity.character_mut() else {
        return Step::Done;
    };

    if active.started {
        return if character.state() == MovementState::Idle {
            Step::Done
        } else {
            Step::Continue(active)
        };
    }

    let origin = character.route_origin(position);
    let Some(path) = navigator.find_path(origin, destination) else {
        debug!(network_id = %id, "move destination unreachable");
        return Step::Done;
    };
    character.redirect(path);
    active.started = true;

    if character.state() == MovementState::Idle {
        Step::Done
    } else {
        Step::Continue(active)
    }
}

fn step_targeted(
    area: &mut Area,
    id: NetworkId,
    owner: Option<SessionId>,
    mut active: ActiveAction,
    target_id: NetworkId,
    navigator: &dyn Navigator,
    effects: &mut Vec<ActionEffect>,
) -> Step {
    let Some(target) = area
        .registry()
        .get_live(target_id)
        .map(|entity| TargetView::read(entity, target_id))
    else {
        abandon(area, id);
        debug!(network_id = %id, target = %target_id, "target gone, action abandoned");
        return Step::Done;
    };

    let range = active.action.required_range();
    let Some(entity) = area.registry_mut().get_by_id_mut(id) else {
        return Step::Done;
    };
    let position = entity.position;
    let Some(character) = entity.character_mut() else {
        return Step::Done;
    };

    let in_range = character.path().is_empty() && position.is_in_range(target.position, range);
    if !in_range {
        let goal = target.position.rounded();
        let needs_route = active.approach_goal != Some(goal) || character.path().is_empty();
        if needs_route {
            character.end_attacking();
            let origin = character.route_origin(position);
            let Some(path) = approach_path(navigator, origin, target.position, range) else {
                character.stop_at_next_waypoint();
                debug!(network_id = %id, target = %target_id, "target unreachable, action abandoned");
                return Step::Done;
            };
            if path.is_empty() && character.path().is_empty() {
                // Standing at the end of the approach yet still out of range.
                return Step::Done;
            }
            character.redirect(path);
            active.approach_goal = Some(goal);
        }
        return Step::Continue(active);
    }

    let damage = character.damage;
    match active.action {
        Action::Attack { .. } => {
            character.begin_attacking();
            let finished = strike(area, owner, &target, damage, effects);
            if finished {
                end_attacking(area, id);
                Step::Done
            } else {
                Step::Continue(active)
            }
        }
        Action::Talk { .. } => {
            if let Some(owner) = owner {
                effects.push(progress(owner, ProgressEventKind::Talk, &target.name));
                push_dialog(effects, owner, &target);
            }
            Step::Done
        }
        Action::Configure { .. } => {
            if let Some(owner) = owner {
                effects.push(progress(owner, ProgressEventKind::Configure, &target.name));
                push_dialog(effects, owner, &target);
            }
            Step::Done
        }
        Action::AreaLink { .. } => {
            if let (Some(owner), Some(link)) = (owner, target.link) {
                effects.push(ActionEffect::Transition {
                    owner,
                    actor: id,
                    link,
                });
            }
            Step::Done
        }
        Action::Move { .. } | Action::Option { .. } | Action::Close { .. } => Step::Done,
    }
}

/// Plan a route from `origin` towards `target`, cut at the first waypoint
/// within `range` of it.
fn approach_path(navigator: &dyn Navigator, origin: Vec2, target: Vec2, range: f64) -> Option<Vec<Vec2>> {
    if origin.is_in_range(target, range) {
        return Some(Vec::new());
    }
    let mut path = navigator.find_path(origin, target.rounded())?;
    if let Some(cut) = path.iter().position(|p| p.is_in_range(target, range)) {
        path.truncate(cut.saturating_add(1));
    }
    Some(path)
}

/// Apply one strike. Returns whether the attack is over.
fn strike(
    area: &mut Area,
    owner: Option<SessionId>,
    target: &TargetView,
    damage: u32,
    effects: &mut Vec<ActionEffect>,
) -> bool {
    if let Some(owner) = owner {
        effects.push(progress(owner, ProgressEventKind::Attack, &target.name));
    }

    let Some(health) = target.health else {
        return true;
    };
    let remaining = health.saturating_sub(damage);
    if let Some(entity) = area.registry_mut().get_by_id_mut(target.id) {
        entity.health = Some(remaining);
    }
    if remaining > 0 {
        return false;
    }

    area.registry_mut().mark_removed(target.id);
    debug!(target = %target.id, name = %target.name, "killed");
    effects.push(ActionEffect::Despawn {
        network_id: target.id,
    });
    if let Some(owner) = owner {
        effects.push(progress(owner, ProgressEventKind::Kill, &target.name));
    }
    true
}

fn progress(owner: SessionId, kind: ProgressEventKind, value: &str) -> ActionEffect {
    ActionEffect::Progress {
        owner,
        kind,
        value: value.to_owned(),
    }
}

fn push_dialog(effects: &mut Vec<ActionEffect>, owner: SessionId, target: &TargetView) {
    if let Some(text) = &target.dialog {
        effects.push(ActionEffect::Dialog {
            owner,
            source: target.id,
            title: Some(target.name.clone()),
            text: text.clone(),
        });
    }
}

fn abandon(area: &mut Area, id: NetworkId) {
    if let Some(character) = area
        .registry_mut()
        .get_by_id_mut(id)
        .and_then(Entity::character_mut)
    {
        character.stop_at_next_waypoint();
        character.end_attacking();
    }
}

fn end_attacking(area: &mut Area, id: NetworkId) {
    if let Some(character) = area
        .registry_mut()
        .get_by_id_mut(id)
        .and_then(Entity::character_mut)
    {
        character.end_attacking();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use realm_types::EntityKind;

    use super::*;
    use crate::actions::start_action;
    use crate::catalog::EntityTemplate;
    use crate::navigator::GridNavigator;

    const DT: f64 = 1.0;

    struct Fixture {
        area: Area,
        hero: NetworkId,
        owner: SessionId,
    }

    fn fixture(width: usize) -> Fixture {
        let mut area = Area::new("field", Arc::new(GridNavigator::open(width, 1)));
        let owner = SessionId::new();
        let template = EntityTemplate {
            speed: 1.0,
            damage: 2,
            ..EntityTemplate::of_kind(EntityKind::Player)
        };
        let hero = area.spawn(&template, "hero", Vec2::ZERO, Some(owner)).unwrap().unwrap();
        Fixture { area, hero, owner }
    }

    fn spawn(area: &mut Area, template: EntityTemplate, name: &str, x: f64) -> NetworkId {
        area.spawn(&template, name, Vec2::new(x, 0.0), None).unwrap().unwrap()
    }

    fn hero_state(f: &Fixture) -> (Vec2, MovementState, bool) {
        let entity = f.area.registry().get_by_id(f.hero).unwrap();
        let character = entity.character().unwrap();
        (entity.position, character.state(), character.active_action().is_some())
    }

    fn run(f: &mut Fixture, ticks: usize) -> Vec<ActionEffect> {
        let mut all = Vec::new();
        for _ in 0..ticks {
            all.extend(f.area.update(DT));
        }
        all
    }

    #[test]
    fn move_walks_to_destination_then_ends() {
        let mut f = fixture(4);
        start_action(&mut f.area, f.hero, Action::Move { destination: Vec2::new(3.0, 0.0) }).unwrap();
        run(&mut f, 3);
        assert_eq!(hero_state(&f), (Vec2::new(3.0, 0.0), MovementState::Idle, true));
        run(&mut f, 1);
        assert_eq!(hero_state(&f), (Vec2::new(3.0, 0.0), MovementState::Idle, false));
    }

    #[test]
    fn unreachable_move_is_dropped() {
        let mut area = Area::new("field", Arc::new({
            let mut nav = GridNavigator::open(3, 1);
            nav.block(2, 0);
            nav
        }));
        let template = EntityTemplate {
            speed: 1.0,
            ..EntityTemplate::of_kind(EntityKind::Npc)
        };
        let id = area.spawn(&template, "a", Vec2::ZERO, None).unwrap().unwrap();
        start_action(&mut area, id, Action::Move { destination: Vec2::new(2.0, 0.0) }).unwrap();
        area.update(DT);
        let character = area.registry().get_by_id(id).and_then(Entity::character).unwrap();
        assert_eq!(character.state(), MovementState::Idle);
        assert!(character.active_action().is_none());
    }

    #[test]
    fn talk_approaches_to_interaction_range_then_fires_once() {
        let mut f = fixture(5);
        let elder = spawn(
            &mut f.area,
            EntityTemplate {
                dialog: Some("Welcome".into()),
                ..EntityTemplate::of_kind(EntityKind::Npc)
            },
            "Elder",
            4.0,
        );
        start_action(&mut f.area, f.hero, Action::Talk { target: elder }).unwrap();

        let effects = run(&mut f, 3);
        assert!(effects.is_empty());
        assert_eq!(hero_state(&f).0, Vec2::new(3.0, 0.0));

        let effects = run(&mut f, 2);
        assert_eq!(
            effects,
            vec![
                ActionEffect::Progress {
                    owner: f.owner,
                    kind: ProgressEventKind::Talk,
                    value: "Elder".into(),
                },
                ActionEffect::Dialog {
                    owner: f.owner,
                    source: elder,
                    title: Some("Elder".into()),
                    text: "Welcome".into(),
                },
            ]
        );
        assert!(!hero_state(&f).2);
    }

    #[test]
    fn attack_strikes_every_tick_until_the_target_dies() {
        let mut f = fixture(3);
        let wolf = spawn(
            &mut f.area,
            EntityTemplate {
                health: Some(5),
                ..EntityTemplate::of_kind(EntityKind::Enemy)
            },
            "Wolf",
            1.0,
        );
        start_action(&mut f.area, f.hero, Action::Attack { target: wolf }).unwrap();

        let effects = run(&mut f, 1);
        assert_eq!(effects.len(), 1);
        assert_eq!(hero_state(&f).1, MovementState::Attacking);
        assert_eq!(f.area.registry().get_by_id(wolf).unwrap().health, Some(3));

        run(&mut f, 1);
        let effects = run(&mut f, 1);
        assert!(effects.contains(&ActionEffect::Despawn { network_id: wolf }));
        assert!(effects.contains(&ActionEffect::Progress {
            owner: f.owner,
            kind: ProgressEventKind::Kill,
            value: "Wolf".into(),
        }));
        assert!(f.area.registry().get_by_id(wolf).unwrap().is_removed());
        assert_eq!(hero_state(&f).1, MovementState::Idle);
        assert!(!hero_state(&f).2);

        assert_eq!(f.area.compact(), 1);
        assert!(f.area.registry().get_by_id(wolf).is_none());
    }

    #[test]
    fn removed_target_abandons_the_approach() {
        let mut f = fixture(6);
        let elder = spawn(&mut f.area, EntityTemplate::of_kind(EntityKind::Npc), "Elder", 5.0);
        start_action(&mut f.area, f.hero, Action::Talk { target: elder }).unwrap();
        run(&mut f, 1);
        assert_eq!(hero_state(&f).1, MovementState::Moving);

        f.area.registry_mut().mark_removed(elder);
        let effects = run(&mut f, 3);
        assert!(effects.is_empty());
        let (position, state, has_action) = hero_state(&f);
        assert_eq!(state, MovementState::Idle);
        assert!(!has_action);
        assert!(position.x < 3.0);
    }

    #[test]
    fn area_link_reports_a_transition() {
        let mut f = fixture(3);
        let door = spawn(
            &mut f.area,
            EntityTemplate {
                link: Some(AreaLinkData {
                    target_area: "cave".into(),
                    target_link: "enter_cave".into(),
                }),
                ..EntityTemplate::of_kind(EntityKind::AreaLink)
            },
            "Door",
            2.0,
        );
        start_action(&mut f.area, f.hero, Action::AreaLink { target: door }).unwrap();
        let effects = run(&mut f, 3);
        assert_eq!(
            effects,
            vec![ActionEffect::Transition {
                owner: f.owner,
                actor: f.hero,
                link: AreaLinkData {
                    target_area: "cave".into(),
                    target_link: "enter_cave".into(),
                },
            }]
        );
    }
}
