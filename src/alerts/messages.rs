use crate::models::{Direction, PostureState};

/// Text shown to the patient when posture escalates.
pub fn notification_message(state: PostureState, tilt_angle_deg: f64, direction: Direction) -> String {
    let magnitude = tilt_angle_deg.abs();
    match state {
        PostureState::Unsafe => format!(
            "Unsafe posture detected! Tilt angle: {magnitude:.1}° {direction}. Please adjust your position."
        ),
        PostureState::Warning => format!(
            "Posture warning: Tilt angle: {magnitude:.1}° {direction}. Consider adjusting your position."
        ),
        PostureState::Safe => {
            "Posture is within safe range. Good job maintaining proper alignment!".to_string()
        }
    }
}
