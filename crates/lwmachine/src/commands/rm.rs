use crate::machine::Machine;
use colored::Colorize;
use lwmachine_driver::{MachineDriver, MachineStore};

pub async fn handle(store: &MachineStore, name: &str, force: bool) -> anyhow::Result<()> {
    println!("{}", format!("Removing '{}'...", name).yellow());

    match Machine::load(store, name).await {
        Ok(machine) => {
            if machine.driver.node().uniq_id.is_some() {
                if let Err(e) = machine.driver.remove().await {
                    if !force {
                        return Err(e.into());
                    }
                    println!(
                        "{}",
                        format!("⚠ Remote destroy failed, removing local record anyway: {}", e)
                            .yellow()
                    );
                }
            } else {
                tracing::info!("machine '{}' has no node, removing local record only", name);
            }
        }
        // An unreadable record can still be dropped locally
        Err(e) if force => {
            println!(
                "{}",
                format!("⚠ Could not load '{}': {}", name, e).yellow()
            );
        }
        Err(e) => return Err(e),
    }

    store.remove(name).await?;

    println!(
        "{}",
        format!("✓ '{}' removed", name).green().bold()
    );
    Ok(())
}
