// shipctl - CLI for private-location ships and team agents
// Copyright (C) 2024 shipctl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::normalize::{ApiFailure, IntegrationRow, PrivateLocationGroup, Report, TeamAgentRow};
use std::io::{self, Write};

const SHIP_COLUMNS: [&str; 4] = ["SHIP ID", "STATE", "LAST BEAT", "NAME"];
const AGENT_COLUMNS: [&str; 4] = ["AGENT ID", "OS", "VERSION", "NAME"];
const SEPARATOR: &str = "-";
const PADDING: usize = 2;

/// Left-aligned text table. Every column but the last is padded to its
/// widest cell plus two spaces; the last column is written as is.
struct Table {
    headers: [&'static str; 4],
    rows: Vec<[String; 4]>,
}

impl Table {
    fn new(headers: [&'static str; 4]) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: [String; 4]) {
        self.rows.push(row);
    }

    fn write(&self, out: &mut impl Write) -> io::Result<()> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }

        let headers = self.headers.map(str::to_string);
        for line in std::iter::once(&headers).chain(self.rows.iter()) {
            let last = line.len() - 1;
            for (idx, cell) in line.iter().enumerate() {
                if idx == last {
                    write!(out, "{cell}")?;
                } else {
                    write!(out, "{:width$}", cell, width = widths[idx] + PADDING)?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Writes the response body untouched, plus a newline.
pub fn raw(body: &[u8], out: &mut impl Write) -> io::Result<()> {
    out.write_all(body)?;
    out.write_all(b"\n")
}

pub fn report(report: &Report, out: &mut impl Write) -> io::Result<()> {
    match report {
        Report::Locations(groups) => locations(groups, out),
        Report::Agents(agents) => team_agents(agents, out),
        Report::Integrations(items) => integrations(items, out),
        Report::Failure(failure) => api_failure(failure, out),
    }
}

fn locations(groups: &[PrivateLocationGroup], out: &mut impl Write) -> io::Result<()> {
    for group in groups {
        writeln!(out, "For OPL/HARBOUR {} & NAMED {}:", group.id, group.name)?;
        let mut table = Table::new(SHIP_COLUMNS);
        for ship in &group.ships {
            table.push([
                ship.ship_id.clone(),
                ship.state.clone(),
                ship.last_beat(),
                ship.name.clone(),
            ]);
        }
        table.write(out)?;
        writeln!(out, "{SEPARATOR}")?;
    }
    Ok(())
}

fn team_agents(agents: &[TeamAgentRow], out: &mut impl Write) -> io::Result<()> {
    let mut table = Table::new(AGENT_COLUMNS);
    for agent in agents {
        table.push([
            agent.agent_id.clone(),
            agent.host_os.clone(),
            agent.version.clone(),
            agent.name.clone(),
        ]);
    }
    table.write(out)?;
    writeln!(out, "{SEPARATOR}")
}

fn integrations(items: &[IntegrationRow], out: &mut impl Write) -> io::Result<()> {
    for item in items {
        writeln!(out)?;
        writeln!(out, "UUID: {}", item.uuid)?;
        writeln!(out, "TYPE: {}", item.kind)?;
        writeln!(out, "DESCRIPTION: {}", item.description)?;
    }
    writeln!(out, "{SEPARATOR}")
}

fn api_failure(failure: &ApiFailure, out: &mut impl Write) -> io::Result<()> {
    match failure {
        ApiFailure::Coded { code, message } => {
            writeln!(out, "Error code: {code}")?;
            writeln!(out, "Error Message: {message}")
        }
        ApiFailure::Status(status) => writeln!(out, "{status}"),
    }
}
