//! Leaderboard and achievements for the current run of the program (nothing is written to disk).

/// Final score at which the completion achievement is reported.
pub const ACHIEVEMENT_SCORE: u32 = 1000;
pub const ACHIEVEMENT_1000_POINTS: &str = "1000pts";
pub const LEADERBOARD_ID: &str = "skystack";

/// How many scores the session leaderboard keeps.
const TOP_SCORES: usize = 10;

/// Destination for finished-game results.
pub trait ScoreReporter {
    fn report_score(&mut self, score: u32);
    fn report_achievement(&mut self, id: &str);
}

/// Game-over handler: submit the score and any achievement it earns.
pub fn report_final_score(reporter: &mut impl ScoreReporter, final_score: u32) {
    reporter.report_score(final_score);
    if final_score >= ACHIEVEMENT_SCORE {
        reporter.report_achievement(ACHIEVEMENT_1000_POINTS);
    }
}

/// In-memory leaderboard: best scores first, plus unlocked achievement ids.
#[derive(Debug, Clone, Default)]
pub struct SessionLeaderboard {
    scores: Vec<u32>,
    achievements: Vec<String>,
    games_played: u32,
}

impl SessionLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self) -> u32 {
        self.scores.first().copied().unwrap_or(0)
    }

    /// Scores in descending order, at most [`TOP_SCORES`] of them.
    pub fn top_scores(&self) -> &[u32] {
        &self.scores
    }

    pub fn achievements(&self) -> &[String] {
        &self.achievements
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    pub fn games_played(&self) -> u32 {
        self.games_played
    }
}

impl ScoreReporter for SessionLeaderboard {
    fn report_score(&mut self, score: u32) {
        self.games_played += 1;
        let at = self.scores.partition_point(|&s| s >= score);
        if at < TOP_SCORES {
            self.scores.insert(at, score);
            self.scores.truncate(TOP_SCORES);
        }
        tracing::info!(leaderboard = LEADERBOARD_ID, score, rank = at + 1, "score reported");
    }

    fn report_achievement(&mut self, id: &str) {
        if self.is_unlocked(id) {
            return;
        }
        tracing::info!(achievement = id, "achievement unlocked");
        self.achievements.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        scores: Vec<u32>,
        achievements: Vec<String>,
    }

    impl ScoreReporter for Recorder {
        fn report_score(&mut self, score: u32) {
            self.scores.push(score);
        }

        fn report_achievement(&mut self, id: &str) {
            self.achievements.push(id.to_string());
        }
    }

    #[test]
    fn test_report_below_threshold() {
        let mut r = Recorder::default();
        report_final_score(&mut r, 999);
        assert_eq!(r.scores, vec![999]);
        assert!(r.achievements.is_empty());
    }

    #[test]
    fn test_report_unlocks_achievement() {
        let mut r = Recorder::default();
        report_final_score(&mut r, 1000);
        assert_eq!(r.scores, vec![1000]);
        assert_eq!(r.achievements, vec![ACHIEVEMENT_1000_POINTS.to_string()]);
    }

    #[test]
    fn test_session_leaderboard_orders_and_caps() {
        let mut board = SessionLeaderboard::new();
        assert_eq!(board.best(), 0);
        for score in [5, 42, 17, 42, 0, 8, 9, 10, 11, 12, 13, 1] {
            board.report_score(score);
        }
        assert_eq!(board.games_played(), 12);
        assert_eq!(board.best(), 42);
        assert_eq!(board.top_scores(), &[42, 42, 17, 13, 12, 11, 10, 9, 8, 5]);
    }

    #[test]
    fn test_achievement_recorded_once() {
        let mut board = SessionLeaderboard::new();
        report_final_score(&mut board, 1200);
        report_final_score(&mut board, 1500);
        assert!(board.is_unlocked(ACHIEVEMENT_1000_POINTS));
        assert_eq!(board.achievements().len(), 1);
    }
}
