//! `meetsync availability`

use std::fmt::Write;

use chrono::{Local, Utc};
use meetsync_core::{AvailabilityGrid, SlotState, UserId};

use crate::config::CliConfig;
use crate::error::CliResult;

pub async fn run(config: &CliConfig, user: UserId, days: u32, json: bool) -> CliResult<()> {
    let grid = super::aggregator(config)?
        .availability_for_days(user, Utc::now(), days, &Local)
        .await?;

    if json {
        return super::print_json(&grid);
    }
    print!("{}", render(&grid));
    Ok(())
}

/// One row per day, one column per hour: `#` busy, `.` free.
pub fn render(grid: &AvailabilityGrid) -> String {
    let mut out = String::from("           ");
    for hour in (0..24).step_by(6) {
        let _ = write!(out, "{hour:<6}");
    }
    out.push('\n');

    for day in &grid.days {
        let _ = write!(out, "{} ", day.date.format("%a %m-%d"));
        for slot in &day.hours {
            out.push(match slot {
                SlotState::Busy => '#',
                SlotState::Free => '.',
            });
        }
        out.push('\n');
    }
    out
}
