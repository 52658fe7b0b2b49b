//! The `check` and `update` commands.
//!
//! Both post the locked skills' folder hashes to the hosted check-updates
//! service; `update` additionally reinstalls each changed skill from its
//! recorded source URL.

use skillpack_skills::{
    lock::LockStore,
    update::{CHECK_UPDATES_URL, check_candidates, check_for_updates},
};

use crate::add::{AddOptions, run_add};

pub async fn run_check() -> anyhow::Result<()> {
    println!("Checking for skill updates...");

    let store = LockStore::default_store();
    let lock = store.load();
    if lock.skills.is_empty() {
        println!("No skills tracked in the lock file.");
        println!("Install skills with `skillpack add <package>`.");
        return Ok(());
    }

    let candidates = check_candidates(&lock);
    if candidates.is_empty() {
        println!("No skills to check.");
        return Ok(());
    }
    println!("Checking {} skill(s) for updates...", candidates.len());

    let client = crate::http_client()?;
    let response = check_for_updates(&client, CHECK_UPDATES_URL, candidates).await?;

    if response.updates.is_empty() {
        println!("All skills are up to date.");
    } else {
        println!("{} update(s) available:", response.updates.len());
        for update in &response.updates {
            println!("  ^ {} (source: {})", update.name, update.source);
        }
        println!("Run `skillpack update` to update all skills.");
    }
    if !response.errors.is_empty() {
        println!(
            "Could not check {} skill(s); they may need a reinstall.",
            response.errors.len()
        );
    }
    Ok(())
}

pub async fn run_update() -> anyhow::Result<()> {
    println!("Checking for skill updates...");

    let store = LockStore::default_store();
    let lock = store.load();
    if lock.skills.is_empty() {
        println!("No skills tracked in the lock file.");
        println!("Install skills with `skillpack add <package>`.");
        return Ok(());
    }

    let candidates = check_candidates(&lock);
    if candidates.is_empty() {
        println!("No skills to check.");
        return Ok(());
    }

    let client = crate::http_client()?;
    let response = check_for_updates(&client, CHECK_UPDATES_URL, candidates).await?;
    if response.updates.is_empty() {
        println!("All skills are up to date.");
        return Ok(());
    }
    println!("Found {} update(s)", response.updates.len());

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for update in &response.updates {
        let Some(entry) = lock.skills.get(&update.name) else {
            continue;
        };
        println!("Updating {}...", update.name);
        let result = run_add(AddOptions {
            source: entry.source_url.clone(),
            is_global: true,
            agents: Vec::new(),
            skills: vec![update.name.clone()],
            list_only: false,
            yes: true,
            all: false,
            full_depth: false,
            copy: false,
        })
        .await;
        match result {
            Ok(()) => succeeded += 1,
            Err(e) => {
                failed += 1;
                println!("  ! failed to update {}: {e}", update.name);
            },
        }
    }

    if succeeded > 0 {
        println!("Updated {succeeded} skill(s)");
    }
    if failed > 0 {
        println!("Failed to update {failed} skill(s)");
    }
    Ok(())
}
