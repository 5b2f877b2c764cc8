use std::{path::Path, time::Duration};

use indicatif::ProgressBar;
use needboard::{Config, Notice, PostalCode, PostalLookup, ViaCep};
use tracing::instrument;

use crate::cli::{config_path, terminal};

#[derive(Debug, clap::Parser)]
pub struct Lookup {
    /// The postal code to look up (punctuation is ignored)
    postal_code: PostalCode,
}

impl Lookup {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = Config::load_or_default(&config_path(root));
        let client = ViaCep::new(&config)?;

        let spinner = create_spinner(&format!("Looking up {}", self.postal_code));
        let result = client.lookup(&self.postal_code);
        spinner.finish_and_clear();

        match result {
            Ok(Some(address)) => {
                println!("Postal code: {}", self.postal_code);
                println!("Street:      {}", address.street);
                println!("District:    {}", address.district);
                println!("City:        {}", address.city);
                println!("State:       {}", address.state);
                Ok(())
            }
            Ok(None) => {
                terminal::notify(&Notice::PostalCodeNotFound(self.postal_code));
                anyhow::bail!("postal code not found")
            }
            Err(e) => {
                tracing::error!("postal code lookup failed: {e}");
                terminal::notify(&Notice::LookupFailed);
                Err(e.into())
            }
        }
    }
}

/// A spinner shown while a lookup is in flight.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}
