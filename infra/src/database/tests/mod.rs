//! Unit tests for the database module

mod manager_tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use wh_shared::{DatabaseName, Environment};

use crate::database::manager::ConnectionManager;
use crate::database::pool::DatabasePool;
use crate::database::testing::ScriptedPool;

/// Manager over healthy scripted pools, with some replaced
pub(crate) fn manager_with(
    overrides: Vec<(DatabaseName, ScriptedPool)>,
) -> (ConnectionManager, BTreeMap<DatabaseName, Arc<ScriptedPool>>) {
    let mut scripted: BTreeMap<DatabaseName, Arc<ScriptedPool>> = DatabaseName::ALL
        .iter()
        .map(|name| (*name, Arc::new(ScriptedPool::healthy())))
        .collect();
    for (name, pool) in overrides {
        scripted.insert(name, Arc::new(pool));
    }

    let pools = scripted.iter().map(|(name, pool)| {
        let pool: Arc<dyn DatabasePool> = pool.clone();
        (*name, pool)
    });
    let manager = ConnectionManager::new(pools, Environment::Production);
    (manager, scripted)
}
