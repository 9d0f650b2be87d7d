use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::time::SystemTime;
use uuid::Uuid;

/// Competition format driving how rounds are produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Single elimination bracket; winners advance by propagation.
    Single,
    /// Swiss system; each round is paired from the running standings.
    Swiss,
    /// Round robin; the full schedule is generated at start.
    Robin,
}

/// Lifecycle status of a tournament.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Configuration and registration are still open.
    Initialization,
    /// The bracket exists and results are being recorded.
    Started,
    /// The organizer closed the event.
    Completed,
}

/// How round-1 opponents are assigned by the bracket builder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PairingMode {
    /// Uniform shuffle of the roster.
    Random,
    /// Shuffle within consecutive seed groups of the given size.
    Seeded {
        /// Number of adjacent roster entries forming one seed group.
        group_size: u32,
    },
    /// Keep the roster order as given.
    Ranked,
}

/// What ends a Swiss tournament.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SwissWinCondition {
    /// Play until the configured round cap.
    FixedRounds,
    /// Stop once a player reaches the given win count.
    PointsToWin {
        /// Wins required to take the event.
        points: u32,
    },
}

/// Win-condition and pairing knobs frozen once a tournament starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TournamentSettings {
    /// Opponent assignment policy for the initial bracket.
    pub pairing_mode: PairingMode,
    /// Swiss termination rule.
    pub swiss_win_condition: SwissWinCondition,
    /// Score threshold that must coincide with the declared winner in a
    /// score report, when set.
    pub auto_win_score: Option<i32>,
    /// Times every pair meets in round robin (1 = single, 2 = double).
    pub robin_legs: u8,
    /// Accept a score report automatically when the sibling report agrees.
    pub auto_accept_agreed: bool,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            pairing_mode: PairingMode::Random,
            swiss_win_condition: SwissWinCondition::FixedRounds,
            auto_win_score: None,
            robin_legs: 2,
            auto_accept_agreed: false,
        }
    }
}

/// Tournament aggregate persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentEntity {
    /// Primary key of the tournament.
    pub id: Uuid,
    /// Display name chosen by the organizer.
    pub name: String,
    /// Competition format.
    pub format: TournamentFormat,
    /// Lifecycle status.
    pub status: TournamentStatus,
    /// Round cap for elimination/Swiss events; `None` means the natural
    /// bracket height (single) or no cap (Swiss).
    pub max_rounds: Option<u32>,
    /// Format settings, immutable once the tournament has started.
    pub settings: TournamentSettings,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the tournament entity was updated.
    pub updated_at: SystemTime,
}

impl TournamentEntity {
    /// Build a fresh tournament in the initialization state.
    pub fn new(
        name: String,
        format: TournamentFormat,
        max_rounds: Option<u32>,
        settings: TournamentSettings,
    ) -> Self {
        let timestamp = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            name,
            format,
            status: TournamentStatus::Initialization,
            max_rounds,
            settings,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

/// Subset of [`TournamentEntity`] returned by list queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentListItemEntity {
    /// Primary key of the tournament.
    pub id: Uuid,
    /// Display name chosen by the organizer.
    pub name: String,
    /// Competition format.
    pub format: TournamentFormat,
    /// Lifecycle status.
    pub status: TournamentStatus,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

impl From<TournamentEntity> for TournamentListItemEntity {
    fn from(entity: TournamentEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            format: entity.format,
            status: entity.status,
            created_at: entity.created_at,
        }
    }
}

/// Origin of the account occupying a bracket slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// Registered account.
    LoggedIn,
    /// Self-registered without an account.
    Anonymous,
    /// Empty slot / bye opponent.
    Placeholder,
    /// Entry created on the player's behalf by the organizer.
    Generated,
}

/// One side of a matchup. A slot without a player id is a placeholder, the
/// winnable-against "bye" opponent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BracketSlot {
    /// Occupying player, `None` for a placeholder.
    pub player_id: Option<Uuid>,
    /// Display name shown in the bracket.
    pub name: String,
    /// Origin of the occupying account.
    pub kind: SlotKind,
    /// Score recorded for this slot, if any.
    pub score: Option<i32>,
}

impl BracketSlot {
    /// Empty slot used for byes and not-yet-propagated positions.
    pub fn placeholder() -> Self {
        Self {
            player_id: None,
            name: String::new(),
            kind: SlotKind::Placeholder,
            score: None,
        }
    }

    /// Slot occupied by a real player.
    pub fn player(player_id: Uuid, name: String, kind: SlotKind) -> Self {
        Self {
            player_id: Some(player_id),
            name,
            kind,
            score: None,
        }
    }

    /// Whether this slot is an empty/bye position.
    pub fn is_placeholder(&self) -> bool {
        self.player_id.is_none()
    }
}

/// One scheduled contest between two slots within a round.
///
/// Invariant: at most one of `winner` / `is_tie` holds. `version` is the
/// optimistic-concurrency token bumped by every store write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchupEntity {
    /// Primary key of the matchup.
    pub id: Uuid,
    /// Owning tournament.
    pub tournament_id: Uuid,
    /// 1-based round number.
    pub round: u32,
    /// 1-based position within the round; defines the elimination topology.
    pub match_number: u32,
    /// The two contested slots, ordered.
    pub slots: [BracketSlot; 2],
    /// Declared winner, if any.
    pub winner: Option<Uuid>,
    /// Whether the matchup ended in a tie.
    pub is_tie: bool,
    /// Optimistic-concurrency version.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

impl MatchupEntity {
    /// Build an open matchup at the given bracket position.
    pub fn new(
        tournament_id: Uuid,
        round: u32,
        match_number: u32,
        slots: [BracketSlot; 2],
    ) -> Self {
        let timestamp = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round,
            match_number,
            slots,
            winner: None,
            is_tie: false,
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Whether a result (winner or tie) has been recorded.
    pub fn is_decided(&self) -> bool {
        self.winner.is_some() || self.is_tie
    }

    /// Index of the slot occupied by `player`, if they participate.
    pub fn slot_of(&self, player: Uuid) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.player_id == Some(player))
    }
}

/// Workflow status of a score report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Awaiting organizer reconciliation.
    Pending,
    /// Committed as the authoritative result; immutable.
    Accepted,
    /// Contradicted by the sibling report; awaiting organizer arbitration.
    Disputed,
}

/// Score claimed for a single participant inside a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ReportedScore {
    /// Player the score belongs to.
    pub player_id: Uuid,
    /// Claimed score.
    pub score: i32,
}

/// A participant's self-submitted claim of a match outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreReportEntity {
    /// Primary key of the report.
    pub id: Uuid,
    /// Matchup the report is about.
    pub match_id: Uuid,
    /// Owning tournament, denormalized for queue queries.
    pub tournament_id: Uuid,
    /// Participant who filed the report.
    pub reporter_id: Uuid,
    /// Claimed score per participant.
    pub scores: Vec<ReportedScore>,
    /// Claimed winner; `None` together with `is_tie` for a tie claim.
    pub winner: Option<Uuid>,
    /// Whether the reporter claims a tie.
    pub is_tie: bool,
    /// Reconciliation status.
    pub status: ReportStatus,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

impl ScoreReportEntity {
    /// Build a fresh pending report for a matchup.
    pub fn new(
        match_id: Uuid,
        tournament_id: Uuid,
        reporter_id: Uuid,
        scores: Vec<ReportedScore>,
        winner: Option<Uuid>,
        is_tie: bool,
    ) -> Self {
        let timestamp = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            match_id,
            tournament_id,
            reporter_id,
            scores,
            winner,
            is_tie,
            status: ReportStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Claimed score for the given player, if present in the report.
    pub fn score_for(&self, player_id: Uuid) -> Option<i32> {
        self.scores
            .iter()
            .find(|entry| entry.player_id == player_id)
            .map(|entry| entry.score)
    }
}
