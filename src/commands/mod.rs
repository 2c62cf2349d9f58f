pub mod doctor;
pub mod leaderboard;
pub mod run;
pub mod schema;
pub mod status;

use crate::config::Config;
use crate::error::ExitError;
use crate::store::FileStore;

/// Open the configured state directory for read-only commands.
fn existing_store(config: &Config) -> Result<FileStore, ExitError> {
    let store = FileStore::new(&config.state.dir);
    if !store.dir().is_dir() {
        return Err(ExitError::Store(format!(
            "state directory {} does not exist",
            store.dir().display()
        )));
    }
    Ok(store)
}
