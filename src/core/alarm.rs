//! Alarm evaluation over per-channel forecasts.

use crate::core::forecast::ForecastResult;

/// True iff at least one forecast predicts a rise.
///
/// Indeterminate forecasts never raise the alarm.
pub fn evaluate_alarm(forecasts: &[ForecastResult]) -> bool {
    forecasts.iter().any(ForecastResult::rises)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forecast::{Forecast, IndeterminateReason, Trend};
    use crate::core::types::Channel;
    use chrono::NaiveDate;

    fn predicted(channel: Channel, trend: Trend) -> ForecastResult {
        ForecastResult {
            channel,
            forecast: Forecast::Predicted {
                trend,
                effective_at: NaiveDate::from_ymd_opt(2024, 3, 5)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
            },
        }
    }

    fn indeterminate(channel: Channel) -> ForecastResult {
        ForecastResult {
            channel,
            forecast: Forecast::Indeterminate {
                reason: IndeterminateReason::SingleClass,
            },
        }
    }

    #[test]
    fn test_alarm_requires_a_rise() {
        assert!(!evaluate_alarm(&[]));
        assert!(!evaluate_alarm(&[
            predicted(Channel::One, Trend::Steady),
            indeterminate(Channel::Two),
            indeterminate(Channel::Three),
        ]));
        assert!(evaluate_alarm(&[
            predicted(Channel::One, Trend::Steady),
            predicted(Channel::Two, Trend::Rises),
            indeterminate(Channel::Three),
        ]));
    }
}
