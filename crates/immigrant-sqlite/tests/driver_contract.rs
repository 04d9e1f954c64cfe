//! Behaviour every `Driver` must share, exercised through `Box<dyn Driver>`.

use immigrant_core::{Driver, DriverConfig, DriverError, MemoryDriver, Revision};
use immigrant_sqlite::SqliteDriver;

fn drivers() -> Vec<(&'static str, Box<dyn Driver>, DriverConfig)> {
    vec![
        (
            "memory",
            Box::new(MemoryDriver::new()) as Box<dyn Driver>,
            DriverConfig::new(),
        ),
        (
            "sqlite",
            Box::new(SqliteDriver::new()) as Box<dyn Driver>,
            DriverConfig::from_path(":memory:"),
        ),
    ]
}

fn r1() -> Revision {
    Revision::new("r1", ["create table t (id integer)"], ["drop table t"])
}

fn r2() -> Revision {
    Revision::new("r2", ["create table u (id integer)"], ["drop table u"])
}

#[test]
fn fresh_driver_reports_empty_history() {
    for (name, mut driver, config) in drivers() {
        driver.init(&config).unwrap();
        assert_eq!(driver.state().unwrap_err(), DriverError::HeadDoesNotExist, "{name}");
        assert_eq!(
            driver.rollback(&r1()).unwrap_err(),
            DriverError::NoRevisionsApplied,
            "{name}"
        );
        driver.close().unwrap();
    }
}

#[test]
fn migrate_rollback_scenario() {
    for (name, mut driver, config) in drivers() {
        driver.init(&config).unwrap();

        driver.migrate(&r1()).unwrap();
        assert_eq!(driver.state().unwrap(), r1(), "{name}");

        driver.rollback(&r1()).unwrap();
        assert_eq!(driver.state().unwrap_err(), DriverError::HeadDoesNotExist, "{name}");

        let err = driver.rollback(&r1()).unwrap_err();
        assert_eq!(err.to_string(), "No revisions applied.", "{name}");
        driver.close().unwrap();
    }
}

#[test]
fn head_follows_latest_entry() {
    for (name, mut driver, config) in drivers() {
        driver.init(&config).unwrap();
        driver.migrate(&r1()).unwrap();
        driver.migrate(&r2()).unwrap();
        assert_eq!(driver.state().unwrap().id(), "r2", "{name}");

        assert!(
            matches!(driver.rollback(&r1()), Err(DriverError::HeadMismatch { .. })),
            "{name}"
        );

        driver.rollback(&r2()).unwrap();
        assert_eq!(driver.state().unwrap(), r1(), "{name}");
        driver.close().unwrap();
    }
}

#[test]
fn lifecycle_is_enforced() {
    for (name, mut driver, config) in drivers() {
        assert_eq!(driver.migrate(&r1()).unwrap_err(), DriverError::NotInitialized, "{name}");

        driver.init(&config).unwrap();
        assert_eq!(
            driver.init(&config).unwrap_err(),
            DriverError::AlreadyInitialized,
            "{name}"
        );

        driver.close().unwrap();
        driver.close().unwrap();
        assert_eq!(driver.state().unwrap_err(), DriverError::Closed, "{name}");
    }
}
