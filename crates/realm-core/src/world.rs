//! The world: every area, every session, and the routing between them.
//!
//! Areas never talk to sessions directly. An area update yields
//! [`ActionEffect`]s, and the world turns them into progress events,
//! dialogs, broadcasts and area transitions. Player commands are buffered
//! in an inbox and dispatched once per tick, after the areas have updated.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use realm_progress::{Progress, StoryBook};
use realm_types::{ClientCommand, NetworkId, ProgressEventKind, ServerMessage, SessionId};
use realm_world::{
    ActionEffect, Area, AreaLinkData, Entity, EntityCatalog, WorldError, dispatch_command,
};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, TickClock};
use crate::config::WorldConfig;
use crate::connection::Connection;
use crate::session::Session;

/// Errors raised by world operations.
#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    /// An area or entity operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The clock could not be created.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// No session with this id is connected.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// The configured player type spawns entities without a network id.
    #[error("player type {0} does not spawn a character")]
    PlayerNotSpawnable(String),
}

/// Outcome of dispatching the buffered commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Commands that became actions.
    pub dispatched: u32,
    /// Commands dropped by validation.
    pub rejected: u32,
    /// Connections closed for protocol violations.
    pub closed: u32,
}

/// All simulated state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    clock: TickClock,
    areas: BTreeMap<String, Area>,
    sessions: BTreeMap<SessionId, Session>,
    catalog: EntityCatalog,
    story: StoryBook,
    inbox: VecDeque<(SessionId, ClientCommand)>,
}

impl World {
    /// Assemble a world from loaded content.
    ///
    /// # Errors
    ///
    /// Fails if the tick interval is zero, the start area or start link is
    /// missing, the player type is unknown, or an area link leads to an
    /// area or link that does not exist.
    pub fn new(
        config: WorldConfig,
        catalog: EntityCatalog,
        story: StoryBook,
        areas: impl IntoIterator<Item = Area>,
    ) -> Result<Self, RealmError> {
        let clock = TickClock::new(config.tick_interval_ms)?;
        let areas: BTreeMap<String, Area> = areas.into_iter().map(|a| (a.name.clone(), a)).collect();

        catalog.data_by_type(&config.player_type)?;
        areas
            .get(&config.start_area)
            .ok_or_else(|| WorldError::AreaNotFound(config.start_area.clone()))?
            .link_by_type(&config.start_link)?;
        for area in areas.values() {
            for link in area.registry().live().filter_map(Entity::link) {
                areas
                    .get(&link.target_area)
                    .ok_or_else(|| WorldError::AreaNotFound(link.target_area.clone()))?
                    .link_by_type(&link.target_link)?;
            }
        }

        info!(
            world = %config.name,
            areas = areas.len(),
            tick_interval_ms = config.tick_interval_ms,
            "World assembled"
        );

        Ok(Self {
            config,
            clock,
            areas,
            sessions: BTreeMap::new(),
            catalog,
            story,
            inbox: VecDeque::new(),
        })
    }

    /// The tick clock.
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub(crate) const fn clock_mut(&mut self) -> &mut TickClock {
        &mut self.clock
    }

    /// Look up an area by name.
    pub fn area(&self, name: &str) -> Option<&Area> {
        self.areas.get(name)
    }

    /// Every area, keyed by name.
    pub const fn areas(&self) -> &BTreeMap<String, Area> {
        &self.areas
    }

    pub(crate) fn areas_mut(&mut self) -> impl Iterator<Item = (&String, &mut Area)> {
        self.areas.iter_mut()
    }

    /// Look up a session.
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// The entity a session controls.
    pub fn character_of(&self, session_id: SessionId) -> Option<&Entity> {
        let session = self.sessions.get(&session_id)?;
        self.areas.get(&session.area)?.registry().get_by_id(session.character)
    }

    /// Number of connected sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Commands waiting for the next dispatch.
    pub fn pending_commands(&self) -> usize {
        self.inbox.len()
    }

    /// Spawn a player character for a new connection in the start area and
    /// announce it to everyone already there.
    ///
    /// # Errors
    ///
    /// Fails if the start area, start link or player template is missing.
    pub fn connect_user(
        &mut self,
        username: &str,
        connection: Box<dyn Connection>,
    ) -> Result<SessionId, RealmError> {
        let template = self.catalog.data_by_type(&self.config.player_type)?;
        let area = self
            .areas
            .get_mut(&self.config.start_area)
            .ok_or_else(|| WorldError::AreaNotFound(self.config.start_area.clone()))?;
        let position = area.link_by_type(&self.config.start_link)?;

        let session_id = SessionId::new();
        let character = area
            .spawn(template, username, position, Some(session_id))?
            .ok_or_else(|| RealmError::PlayerNotSpawnable(self.config.player_type.clone()))?;

        if let Some(entity) = area.registry().get_by_id(character) {
            broadcast(
                &self.sessions,
                area.connections(),
                &ServerMessage::Add {
                    entity: entity.snapshot(),
                },
            );
        }
        area.add_connection(session_id);

        let session = Session::new(
            session_id,
            username,
            connection,
            area.name.clone(),
            character,
            Progress::new(&self.story),
        );
        self.sessions.insert(session_id, session);

        info!(
            session_id = %session_id,
            username,
            network_id = %character,
            users = self.sessions.len(),
            "User connected"
        );
        Ok(session_id)
    }

    /// Send the entering client its area, log and character, then fire
    /// the `enterArea` event.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::UnknownSession`] if the session is not
    /// connected.
    pub fn ready(&mut self, session_id: SessionId) -> Result<(), RealmError> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(RealmError::UnknownSession(session_id))?;
        let area = self
            .areas
            .get(&session.area)
            .ok_or_else(|| WorldError::AreaNotFound(session.area.clone()))?;
        enter(session, area);
        Ok(())
    }

    /// Buffer a command for the next dispatch. Returns `false` if the
    /// session is unknown.
    pub fn enqueue_command(&mut self, session_id: SessionId, command: ClientCommand) -> bool {
        if !self.sessions.contains_key(&session_id) {
            return false;
        }
        self.inbox.push_back((session_id, command));
        true
    }

    /// Remove a session: despawn its character, tell the area, and release
    /// its progress subscriptions.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::UnknownSession`] if the session is not
    /// connected, which includes a second disconnect of the same session.
    pub fn disconnect_user(&mut self, session_id: SessionId) -> Result<(), RealmError> {
        let mut session = self
            .sessions
            .remove(&session_id)
            .ok_or(RealmError::UnknownSession(session_id))?;

        if let Some(area) = self.areas.get_mut(&session.area) {
            area.remove_connection(session_id);
            area.registry_mut().mark_removed(session.character);
            broadcast(
                &self.sessions,
                area.connections(),
                &ServerMessage::Remove {
                    network_id: session.character,
                },
            );
        }
        let released = session.dispose();
        self.inbox.retain(|(id, _)| *id != session_id);

        info!(
            session_id = %session_id,
            username = %session.username,
            released,
            users = self.sessions.len(),
            "User disconnected"
        );
        Ok(())
    }

    /// Send `message` to every session viewing `area_name`.
    pub fn broadcast(&self, area_name: &str, message: &ServerMessage) {
        if let Some(area) = self.areas.get(area_name) {
            broadcast(&self.sessions, area.connections(), message);
        }
    }

    /// Route the effects produced by `area_name`'s update.
    ///
    /// A transition that cannot complete is logged and skipped; the
    /// traveller stays where it was.
    pub fn apply_effects(&mut self, area_name: &str, effects: Vec<ActionEffect>) {
        for effect in effects {
            match effect {
                ActionEffect::Progress { owner, kind, value } => {
                    if let Some(session) = self.sessions.get_mut(&owner) {
                        session.emit(kind, &value);
                    }
                }
                ActionEffect::Dialog {
                    owner,
                    source,
                    title,
                    text,
                } => {
                    if let Some(session) = self.sessions.get_mut(&owner) {
                        session.open_dialog = Some(source);
                        session.send(ServerMessage::Dialog { title, text });
                    }
                }
                ActionEffect::DialogClosed { owner } => {
                    if let Some(session) = self.sessions.get_mut(&owner) {
                        session.open_dialog = None;
                    }
                }
                ActionEffect::Despawn { network_id } => {
                    self.broadcast(area_name, &ServerMessage::Remove { network_id });
                }
                ActionEffect::Transition { owner, actor, link } => {
                    if let Err(e) = self.transition(area_name, owner, actor, &link) {
                        warn!(
                            session_id = %owner,
                            network_id = %actor,
                            from = area_name,
                            to = %link.target_area,
                            error = %e,
                            "Area transition failed"
                        );
                    }
                }
            }
        }
    }

    /// Move a session's character through an area link.
    ///
    /// Every lookup that can fail happens before anything is mutated.
    fn transition(
        &mut self,
        from: &str,
        owner: SessionId,
        actor: NetworkId,
        link: &AreaLinkData,
    ) -> Result<(), RealmError> {
        let arrival = self
            .areas
            .get(&link.target_area)
            .ok_or_else(|| WorldError::AreaNotFound(link.target_area.clone()))?
            .link_by_type(&link.target_link)?;

        if link.target_area == from {
            let area = self
                .areas
                .get_mut(from)
                .ok_or_else(|| WorldError::AreaNotFound(from.to_owned()))?;
            area.relocate(actor, arrival)?;
            area.remove_connection(owner);
            broadcast(
                &self.sessions,
                area.connections(),
                &ServerMessage::Remove { network_id: actor },
            );
            if let Some(entity) = area.registry().get_live(actor) {
                broadcast(
                    &self.sessions,
                    area.connections(),
                    &ServerMessage::Add {
                        entity: entity.snapshot(),
                    },
                );
            }
            area.add_connection(owner);
            if let Some(session) = self.sessions.get_mut(&owner) {
                session.open_dialog = None;
                enter(session, area);
            }
            info!(session_id = %owner, network_id = %actor, area = from, "Area transition in place");
            return Ok(());
        }

        let Some(traveller) = self
            .areas
            .get(from)
            .ok_or_else(|| WorldError::AreaNotFound(from.to_owned()))?
            .registry()
            .get_live(actor)
            .map(|e| e.relocated(arrival))
        else {
            return Ok(());
        };

        let snapshot = traveller.snapshot();
        if let Some(target) = self.areas.get_mut(&link.target_area) {
            target.insert(traveller)?;
            broadcast(
                &self.sessions,
                target.connections(),
                &ServerMessage::Add { entity: snapshot },
            );
            target.add_connection(owner);
        }

        if let Some(source) = self.areas.get_mut(from) {
            source.registry_mut().mark_removed(actor);
            source.remove_connection(owner);
            broadcast(
                &self.sessions,
                source.connections(),
                &ServerMessage::Remove { network_id: actor },
            );
        }

        if let (Some(session), Some(target)) =
            (self.sessions.get_mut(&owner), self.areas.get(&link.target_area))
        {
            session.area.clone_from(&target.name);
            session.open_dialog = None;
            enter(session, target);
        }
        info!(
            session_id = %owner,
            network_id = %actor,
            from,
            to = %link.target_area,
            "Area transition"
        );
        Ok(())
    }

    /// Validate and start every buffered command, in arrival order.
    pub fn dispatch_commands(&mut self) -> DispatchStats {
        let mut stats = DispatchStats::default();
        let pending = std::mem::take(&mut self.inbox);

        for (session_id, command) in pending {
            let Some(session) = self.sessions.get(&session_id) else {
                continue;
            };
            let area_name = session.area.clone();
            let character = session.character;
            let Some(area) = self.areas.get_mut(&area_name) else {
                continue;
            };

            match dispatch_command(area, character, &command) {
                Ok(effects) => {
                    stats.dispatched = stats.dispatched.saturating_add(1);
                    self.apply_effects(&area_name, effects);
                }
                Err(reason) if reason.is_protocol_violation() => {
                    warn!(
                        session_id = %session_id,
                        command = %command.action,
                        "Protocol violation, closing connection"
                    );
                    if let Some(session) = self.sessions.get(&session_id) {
                        session.close();
                    }
                    if let Err(e) = self.disconnect_user(session_id) {
                        warn!(session_id = %session_id, error = %e, "Disconnect after violation failed");
                    }
                    stats.closed = stats.closed.saturating_add(1);
                }
                Err(_) => {
                    stats.rejected = stats.rejected.saturating_add(1);
                }
            }
        }

        if stats != DispatchStats::default() {
            debug!(
                dispatched = stats.dispatched,
                rejected = stats.rejected,
                closed = stats.closed,
                "Commands dispatched"
            );
        }
        stats
    }

    /// Sweep entities removed this tick from every area.
    pub fn compact(&mut self) -> usize {
        self.areas.values_mut().map(Area::compact).sum()
    }
}

/// Send the entry sequence for `area` to `session`.
fn enter(session: &mut Session, area: &Area) {
    session.send(area.area_data());
    session.send(session.progress().log_data());
    if let Some(entity) = area.registry().get_by_id(session.character) {
        session.send(ServerMessage::Player {
            entity: entity.snapshot(),
        });
    }
    session.emit(ProgressEventKind::EnterArea, &area.name);
}

fn broadcast(sessions: &BTreeMap<SessionId, Session>, viewers: &BTreeSet<SessionId>, message: &ServerMessage) {
    for id in viewers {
        if let Some(session) = sessions.get(id) {
            session.send(message.clone());
        }
    }
}
