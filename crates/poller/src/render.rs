//! Plain-text dashboard.

use blockview_snapshot::Snapshot;
use std::fmt::Write;

use crate::state::{PollState, PollStatus};

/// Renders the dashboard for `state`.
///
/// A retained snapshot is always shown, with a stale marker when the latest
/// refresh failed. Without one the output is a loading or error line.
pub fn render(state: &PollState) -> String {
    match (state.current(), state.status()) {
        (Some(snapshot), status) => {
            let mut out = render_snapshot(snapshot);
            if status == PollStatus::Failed {
                if let Some(err) = state.last_error() {
                    let _ = writeln!(out, "\n(stale: last refresh failed: {err})");
                }
            }
            out
        }
        (None, PollStatus::Failed) => match state.last_error() {
            Some(err) => format!("Error: {err}\n"),
            None => "Error\n".to_string(),
        },
        (None, _) => "Loading...\n".to_string(),
    }
}

fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Bitcoin Block Explorer");
    let _ = writeln!(out, "Latest Block:      {}", snapshot.block_height());
    let _ = writeln!(out, "Transaction Count: {}", snapshot.transaction_count());
    let _ = writeln!(out, "Average Fee:       {:.3}K Sats", snapshot.average_fee());
    let _ = writeln!(out, "Total Volume:      {:.3} BTC", snapshot.total_volume());
    let _ = writeln!(out, "Market Price:      ${:.2}", snapshot.market_price());
    let _ = writeln!(out, "Mempool Size:      {}", snapshot.mempool_size());
    if let Some(difficulty) = snapshot.difficulty() {
        let _ = writeln!(out, "Difficulty:        {difficulty}");
    }
    if let Some(hash_rate) = snapshot.hash_rate() {
        let _ = writeln!(out, "Hash Rate:         {hash_rate}");
    }

    let _ = writeln!(out, "\nRecent Transactions");
    for tx in snapshot.recent_transactions() {
        let _ = writeln!(out, "  {}  {} satoshis", tx.hash, tx.fee);
    }
    out
}
