use crate::machine::Machine;
use colored::Colorize;
use lwmachine_driver::{MachineDriver, MachineStore};

#[derive(Debug, Clone, Copy)]
pub enum PowerAction {
    Start,
    Stop,
    Restart,
    Kill,
}

impl PowerAction {
    fn progress(self) -> &'static str {
        match self {
            Self::Start => "Starting",
            Self::Stop => "Stopping",
            Self::Restart => "Restarting",
            Self::Kill => "Killing",
        }
    }

    fn done(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
            Self::Kill => "killed",
        }
    }
}

pub async fn handle(store: &MachineStore, name: &str, action: PowerAction) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("{} '{}'...", action.progress(), name).yellow()
    );

    let machine = Machine::load(store, name).await?;
    let driver = &machine.driver;

    match action {
        PowerAction::Start => driver.start().await?,
        PowerAction::Stop => driver.stop().await?,
        PowerAction::Restart => driver.restart().await?,
        PowerAction::Kill => driver.kill().await?,
    }

    println!(
        "{}",
        format!("✓ '{}' {}", name, action.done()).green().bold()
    );
    Ok(())
}
