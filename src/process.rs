/// A process that matched one of the requested names.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ClosedProcess {
    pub name: String,
    pub pid: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseOutcome {
    pub closed: Vec<ClosedProcess>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<ClosedProcess>,
}

impl CloseOutcome {
    pub fn count(&self) -> usize {
        self.closed.len()
    }
}

/// Access to the running processes of the machine.
pub trait ProcessTable {
    fn running(&mut self) -> Vec<ClosedProcess>;
    fn kill(&mut self, pid: u32) -> bool;
}

pub struct SystemProcesses {
    sys: sysinfo::System,
}

impl SystemProcesses {
    pub fn new() -> Self {
        Self {
            sys: sysinfo::System::new(),
        }
    }
}

impl ProcessTable for SystemProcesses {
    fn running(&mut self) -> Vec<ClosedProcess> {
        self.sys.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
        self.sys
            .processes()
            .iter()
            .map(|(pid, p)| ClosedProcess {
                name: p.name().to_string_lossy().to_string(),
                pid: pid.as_u32(),
            })
            .collect()
    }

    fn kill(&mut self, pid: u32) -> bool {
        self.sys
            .process(sysinfo::Pid::from_u32(pid))
            .map(|p| p.kill())
            .unwrap_or(false)
    }
}

fn name_matches(process: &str, wanted: &str) -> bool {
    !wanted.is_empty() && process.to_lowercase().contains(&wanted.to_lowercase())
}

/// Ask every process whose name contains one of `names` to terminate.
/// Each kill is independent; one failure does not stop the rest.
pub fn close_processes(table: &mut dyn ProcessTable, names: &[String]) -> CloseOutcome {
    let mut outcome = CloseOutcome::default();

    for process in table.running() {
        if !names.iter().any(|x| name_matches(&process.name, x)) {
            continue;
        }
        if table.kill(process.pid) {
            log::info!("Closed process {} ({})", &process.name, process.pid);
            outcome.closed.push(process);
        } else {
            log::warn!("Unable to close process {} ({})", &process.name, process.pid);
            outcome.failed.push(process);
        }
    }

    outcome
}
