use std::collections::VecDeque;
use std::time::Duration;

use crate::entity::TimedPosition;

/// Position at `render_ts` from the samples bracketing it, if any.
///
/// Samples older than the bracket are dropped from the front, but the newest
/// sample is always kept so a bracket can form once the next one arrives.
/// Once `render_ts` reaches the newest sample there is nothing to bracket and
/// the caller keeps whatever it displayed last.
pub fn interpolate(buffer: &mut VecDeque<TimedPosition>, render_ts: Duration) -> Option<f32> {
    while buffer.len() >= 2 && buffer[1].timestamp <= render_ts {
        buffer.pop_front();
    }

    let (from, to) = match (buffer.front(), buffer.get(1)) {
        (Some(from), Some(to)) => (*from, *to),
        _ => return None,
    };
    if render_ts < from.timestamp || render_ts > to.timestamp {
        return None;
    }

    Some(lerp_between(from, to, render_ts))
}

fn lerp_between(from: TimedPosition, to: TimedPosition, at: Duration) -> f32 {
    if at >= to.timestamp {
        return to.position;
    }
    let span = (to.timestamp - from.timestamp).as_secs_f64();
    let t = (at - from.timestamp).as_secs_f64() / span;
    from.position + (to.position - from.position) * t as f32
}
