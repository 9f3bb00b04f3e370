//! Profile Watcher - minimal observable-store demo
//!
//! Subscribes at several depths of a user profile and prints what each
//! subscriber sees as the profile is edited.
//!
//! Run: OBSERVABLE_LOG_MODE=debug cargo run -p keypath-observable-store --example profile_watcher

use observable_store::logging::init_logging_from_env;
use observable_store::{Store, Value};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;

    let store = Store::with_value(Value::from(json!({
        "profile": {
            "name": "ada",
            "address": {"city": "London", "zip": "NW1"}
        }
    })))?;

    store.watch("", |_, _| println!("[root] something changed"));
    store.watch("profile", |profile, path| {
        println!("[{}] now {}", path, profile.to_json());
    });
    store.watch("profile.address.city", |city, path| {
        println!("[{}] city is {:?}", path, city.as_str());
    });

    println!("-- rename");
    store.set("profile.name", "grace")?;

    println!("-- move (replaces the whole address)");
    store.set(
        "profile.address",
        Value::from(json!({"city": "Arlington", "zip": "22201"})),
    )?;

    println!("-- no-op write");
    let changed = store.set("profile.address.city", "Arlington")?;
    println!("changed: {}", changed);

    println!("-- quiet write");
    store.set_silent("profile.name", "ada")?;

    println!("-- bad path");
    if let Err(err) = store.set("profile.phone.mobile", "555") {
        println!("error: {}", err);
    }

    Ok(())
}
