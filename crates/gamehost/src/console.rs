//! The administrative console.
//!
//! Each line typed by the operator runs as one task on the event loop and
//! returns the lines to print. The console thread waits for that reply,
//! so commands look synchronous from the terminal while the loop keeps
//! its own pace.

use gamehost_transport::Transport;

use crate::{Engine, ProcessRunner};

const USAGE: &[&str] = &[
    "Available Commands:",
    "stop - stop the daemon",
    "list - list servers and players",
    "info - dump info about users, servers, games",
    "save - save users, servers, games",
    "reload - reload all saves and configs",
    "sleep - pause the main loop",
    "reset - clear all runtime data",
    "exec <cmd> [args...] - start an external command",
    "worlds - list the worlds catalog",
];

impl<T: Transport, P: ProcessRunner> Engine<T, P> {
    /// Runs one console command and returns its output.
    pub fn console_command(&mut self, cmd: &str, args: &[String]) -> Vec<String> {
        match (cmd, args) {
            ("stop", []) => {
                self.request_stop();
                vec!["Stopping daemon...".to_string()]
            }
            ("list", []) => self.list_endpoints(),
            ("info", []) => self.dump_records(),
            ("save", []) => match self.store.save_all() {
                Ok(()) => vec!["Saved users, servers, games.".to_string()],
                Err(e) => {
                    tracing::error!(error = %e, "console save failed");
                    vec![format!("Save failed: {e}")]
                }
            },
            ("reload", []) => {
                self.store.load_all();
                self.catalog.invalidate();
                vec!["Reloaded saves and flushed cached config files.".to_string()]
            }
            ("sleep", []) => {
                let duration = self.config.sleep_duration;
                self.pause = Some(duration);
                vec![format!("Sleeping for {} seconds...", duration.as_secs())]
            }
            ("reset", []) => {
                self.store.reset();
                self.catalog.invalidate();
                match self.store.save_all() {
                    Ok(()) => vec!["Reset all runtime data.".to_string()],
                    Err(e) => vec![format!("Reset, but save failed: {e}")],
                }
            }
            ("exec", [program, rest @ ..]) => {
                tracing::info!(%program, ?rest, "console exec");
                match self.runner.exec(program, rest) {
                    Ok(()) => vec![format!("Executing {program} {}", rest.join(" "))
                        .trim_end()
                        .to_string()],
                    Err(e) => vec![e.to_string()],
                }
            }
            ("worlds", []) => self.list_worlds(),
            _ => USAGE.iter().map(|line| (*line).to_string()).collect(),
        }
    }

    fn list_endpoints(&self) -> Vec<String> {
        let mut out = vec!["Server Player List".to_string()];
        for endpoint in self.transport.endpoints() {
            out.push(format!("= {endpoint}"));
            out.extend(endpoint.players.iter().map(|p| format!("  - {}", p.name)));
        }
        out
    }

    fn dump_records(&self) -> Vec<String> {
        fn json_line<R: serde::Serialize>(record: &R) -> String {
            serde_json::to_string(record)
                .map_or_else(|e| format!("  <unprintable: {e}>"), |json| format!("  {json}"))
        }

        let users: Vec<_> = self.store.users().collect();
        let sessions: Vec<_> = self.store.sessions().collect();
        let workers = self.store.workers();

        let mut out = Vec::with_capacity(users.len() + workers.len() + sessions.len() + 3);
        out.push(format!("Users {}", users.len()));
        out.extend(users.iter().map(json_line));
        out.push(format!("Servers {}", workers.len()));
        out.extend(workers.iter().map(json_line));
        out.push(format!("Games {}", sessions.len()));
        out.extend(sessions.iter().map(json_line));
        out
    }

    fn list_worlds(&mut self) -> Vec<String> {
        let mut out = vec!["Worlds:".to_string()];
        out.extend(
            self.catalog
                .worlds()
                .iter()
                .enumerate()
                .map(|(i, w)| format!("#{i} game={} id={} path={}", w.game_name, w.map_id, w.map_path)),
        );
        out
    }
}
