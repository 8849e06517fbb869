use crate::machine::Machine;
use colored::Colorize;
use lwmachine_driver::{MachineDriver, MachineState, MachineStore};

pub async fn status(store: &MachineStore, name: &str) -> anyhow::Result<()> {
    let machine = Machine::load(store, name).await?;

    match machine.driver.get_state().await {
        Ok(state) => {
            let label = state.to_string();
            let label = match state {
                MachineState::Running => label.green(),
                MachineState::Stopped => label.dimmed(),
                MachineState::Error => label.red(),
                MachineState::Starting | MachineState::Stopping => label.yellow(),
            };
            println!("{}", label);
            Ok(())
        }
        Err(e) => {
            println!("{}", MachineState::Error.to_string().red());
            Err(e.into())
        }
    }
}

pub async fn ip(store: &MachineStore, name: &str) -> anyhow::Result<()> {
    let mut machine = Machine::load(store, name).await?;
    let cached = machine.driver.node().ip_address.is_some();

    let ip = machine.driver.get_ip().await?;
    if !cached && machine.driver.node().ip_address.is_some() {
        machine.save(store).await?;
    }

    println!("{}", ip);
    Ok(())
}

pub async fn url(store: &MachineStore, name: &str) -> anyhow::Result<()> {
    let mut machine = Machine::load(store, name).await?;
    let cached = machine.driver.node().ip_address.is_some();

    let url = machine.driver.get_url().await?;
    if !cached && machine.driver.node().ip_address.is_some() {
        machine.save(store).await?;
    }

    println!("{}", url);
    Ok(())
}
