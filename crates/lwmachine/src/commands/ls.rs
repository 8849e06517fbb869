use colored::Colorize;
use lwmachine_driver::{MachineRecord, MachineStore};
use lwmachine_liquidweb::LiquidWebState;

pub async fn handle(store: &MachineStore) -> anyhow::Result<()> {
    let names = store.list().await?;

    println!(
        "{}",
        format!(
            "{:<20} {:<10} {:<12} {:<16} {}",
            "NAME", "DRIVER", "NODE", "IP", "CREATED"
        )
        .bold()
    );

    for name in names {
        let record: MachineRecord<LiquidWebState> = match store.load(&name).await {
            Ok(record) => record,
            Err(e) => {
                println!("{:<20} {}", name, format!("error: {}", e).red());
                continue;
            }
        };

        let node = &record.driver.node;
        println!(
            "{:<20} {:<10} {:<12} {:<16} {}",
            name,
            record.driver_name,
            node.uniq_id.as_deref().unwrap_or("-"),
            node.ip_address.as_deref().unwrap_or("-"),
            record
                .created_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
