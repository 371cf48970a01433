//! Registry of agents, squads, zones and spawn markers.
use std::collections::HashMap;

use glam::Vec3;
use tactics_core::{AgentId, CombatDecision, ExtractionZone, Faction, SpawnMarker, SquadId};

/// Per-agent facts reported by the host each tick.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentInfo {
    pub id: AgentId,
    pub faction: Faction,
    pub squad: Option<SquadId>,
    pub position: Vec3,
    pub threat: Option<Vec3>,
    pub decision: CombatDecision,
}

impl AgentInfo {
    pub fn new(id: AgentId, faction: Faction, position: Vec3) -> Self {
        Self {
            id,
            faction,
            squad: None,
            position,
            threat: None,
            decision: CombatDecision::None,
        }
    }

    pub fn in_squad(mut self, squad: SquadId) -> Self {
        self.squad = Some(squad);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Squad {
    pub leader: AgentId,
    pub members: Vec<AgentId>,
}

#[derive(Debug, Default)]
pub struct World {
    pub(crate) agents: HashMap<AgentId, AgentInfo>,
    pub(crate) squads: HashMap<SquadId, Squad>,
    pub(crate) zones: Vec<ExtractionZone>,
    pub(crate) spawns: Vec<SpawnMarker>,
}

impl World {
    pub fn agent(&self, id: AgentId) -> Option<&AgentInfo> {
        self.agents.get(&id)
    }

    pub fn zones(&self) -> &[ExtractionZone] {
        &self.zones
    }

    pub fn spawns(&self) -> &[SpawnMarker] {
        &self.spawns
    }

    pub fn squad(&self, id: SquadId) -> Option<&Squad> {
        self.squads.get(&id)
    }

    /// Squad of `agent`, if it belongs to one.
    pub fn squad_of(&self, agent: AgentId) -> Option<&Squad> {
        self.agents
            .get(&agent)
            .and_then(|info| info.squad)
            .and_then(|squad| self.squads.get(&squad))
    }

    pub(crate) fn insert_agent(&mut self, info: AgentInfo) {
        if let Some(squad_id) = info.squad {
            let squad = self.squads.entry(squad_id).or_insert_with(|| Squad {
                leader: info.id,
                members: Vec::new(),
            });
            if !squad.members.contains(&info.id) {
                squad.members.push(info.id);
            }
        }
        self.agents.insert(info.id, info);
    }

    /// Removes the agent; a squad that loses its leader promotes the next
    /// member, and an empty squad is dropped.
    pub(crate) fn remove_agent(&mut self, id: AgentId) -> Option<AgentInfo> {
        let info = self.agents.remove(&id)?;
        if let Some(squad_id) = info.squad
            && let Some(squad) = self.squads.get_mut(&squad_id)
        {
            squad.members.retain(|&m| m != id);
            match squad.members.first() {
                None => {
                    self.squads.remove(&squad_id);
                }
                Some(&next) if squad.leader == id => squad.leader = next,
                Some(_) => {}
            }
        }
        Some(info)
    }
}
