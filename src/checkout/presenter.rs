use serde::{Deserialize, Serialize};

use super::session::generate_session_id;

/// Seconds a QR payload stays on screen before the session is rotated.
pub const SESSION_WINDOW_SECS: u32 = 120;

/// Below this many seconds the presenter flags imminent rotation. Purely a
/// presentation hint; rotation timing is unchanged.
pub const EXPIRY_WARNING_SECS: u32 = 30;

/// Result of one countdown tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Active {
        time_left: u32,
        expiring_soon: bool,
    },
    /// The window lapsed: a replacement session was minted and the
    /// countdown restarted. The caller persists a fresh mirror snapshot
    /// for the new session id.
    Rotated {
        previous_session_id: String,
        session_id: String,
    },
}

/// Countdown state machine behind the payment QR screen. Holds the session
/// id currently on display and rotates it when the window lapses. Dropping
/// the presenter is cancellation; nothing durable is cleaned up, and a
/// pending record persisted for a rotated-away session id stays resolvable
/// until its own expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPresenter {
    session_id: String,
    time_left: u32,
}

impl QrPresenter {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            time_left: SESSION_WINDOW_SECS,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn expiring_soon(&self) -> bool {
        self.time_left <= EXPIRY_WARNING_SECS
    }

    /// Advances the countdown by one second. At zero the presenter mints a
    /// replacement session id and resets the window.
    pub fn tick(&mut self) -> Tick {
        self.time_left = self.time_left.saturating_sub(1);

        if self.time_left == 0 {
            let previous = std::mem::replace(&mut self.session_id, generate_session_id());
            self.time_left = SESSION_WINDOW_SECS;
            Tick::Rotated {
                previous_session_id: previous,
                session_id: self.session_id.clone(),
            }
        } else {
            Tick::Active {
                time_left: self.time_left,
                expiring_soon: self.expiring_soon(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_starts_at_the_full_window() {
        let presenter = QrPresenter::new(generate_session_id());
        assert_eq!(presenter.time_left(), SESSION_WINDOW_SECS);
        assert!(!presenter.expiring_soon());
    }

    #[test]
    fn ticks_decrement_until_the_warning_threshold() {
        let mut presenter = QrPresenter::new(generate_session_id());

        for expected in (EXPIRY_WARNING_SECS + 1..SESSION_WINDOW_SECS).rev() {
            match presenter.tick() {
                Tick::Active {
                    time_left,
                    expiring_soon,
                } => {
                    assert_eq!(time_left, expected);
                    assert!(!expiring_soon);
                }
                Tick::Rotated { .. } => panic!("rotated before the window lapsed"),
            }
        }

        match presenter.tick() {
            Tick::Active {
                time_left,
                expiring_soon,
            } => {
                assert_eq!(time_left, EXPIRY_WARNING_SECS);
                assert!(expiring_soon);
            }
            Tick::Rotated { .. } => panic!("rotated before the window lapsed"),
        }
    }

    #[test]
    fn lapsed_window_rotates_to_a_fresh_session_and_resets() {
        let original = generate_session_id();
        let mut presenter = QrPresenter::new(original.clone());

        let mut rotation = None;
        for _ in 0..SESSION_WINDOW_SECS {
            if let Tick::Rotated {
                previous_session_id,
                session_id,
            } = presenter.tick()
            {
                rotation = Some((previous_session_id, session_id));
                break;
            }
        }

        let (previous, fresh) = rotation.expect("window lapse should rotate");
        assert_eq!(previous, original);
        assert_ne!(fresh, original);
        assert_eq!(presenter.session_id(), fresh);
        assert_eq!(presenter.time_left(), SESSION_WINDOW_SECS);
    }

    #[test]
    fn rotation_repeats_every_window() {
        let mut presenter = QrPresenter::new(generate_session_id());
        let mut rotations = Vec::new();

        for _ in 0..(SESSION_WINDOW_SECS * 3) {
            if let Tick::Rotated { session_id, .. } = presenter.tick() {
                rotations.push(session_id);
            }
        }

        assert_eq!(rotations.len(), 3);
        assert_ne!(rotations[0], rotations[1]);
        assert_ne!(rotations[1], rotations[2]);
    }
}
