use lwmachine_driver::{MachineRecord, MachineStore};
use lwmachine_liquidweb::{DRIVER_NAME, HttpConnector, LiquidWebDriver, LiquidWebState};

/// A stored machine with its driver rebuilt from the record
pub struct Machine {
    pub record: MachineRecord<LiquidWebState>,
    pub driver: LiquidWebDriver<HttpConnector>,
}

impl Machine {
    pub async fn load(store: &MachineStore, name: &str) -> anyhow::Result<Self> {
        let record: MachineRecord<LiquidWebState> = store.load(name).await?;

        if record.driver_name != DRIVER_NAME {
            anyhow::bail!(
                "machine '{}' uses unsupported driver '{}'",
                name,
                record.driver_name
            );
        }

        // The record may have been written under a different store root
        let mut base = record.base.clone();
        base.store_path = store.machine_dir(name);

        let driver =
            LiquidWebDriver::from_state(base, record.driver.clone(), HttpConnector::default());

        Ok(Self { record, driver })
    }

    /// Write the driver's current state back to the store
    pub async fn save(&mut self, store: &MachineStore) -> anyhow::Result<()> {
        self.record.update(self.driver.state());
        store.save(&self.record).await?;
        Ok(())
    }
}
