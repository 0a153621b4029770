// ABOUTME: Release state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce valid transitions at compile time.

/// Files staged remotely, nothing mutated yet.
/// Available actions: `swap_config()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Staged;

/// New configuration snapshot written; previous slot holds the old one.
/// Available actions: `backup_running()`, `restore()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigSwapped;

/// Running containers stopped and renamed aside.
/// Available actions: `start_release()`, `restore()`
#[derive(Debug, Clone, Copy, Default)]
pub struct BackedUp;

/// New service set brought up, health not yet established.
/// Available actions: `await_healthy()`, `restore()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Starting;

/// Health endpoint answered; the new release is serving.
/// Available actions: `commit()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Healthy;

/// Backups discarded; the run is over.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Committed;
