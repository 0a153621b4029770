// ABOUTME: In-memory mock of the remote host capability traits.
// ABOUTME: Records every mutating call so tests can assert on side effects.

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::time::Duration;

use caravel::release::is_backup_name;
use caravel::remote::{
    ContainerOps, ContainerState, FileOps, HealthProbe, HostError, HostInfo, HostResult,
};
use caravel::types::{Arch, ImageRef, ServiceName};

/// A container on the mock host. The `service` field models the compose
/// labels that survive a rename.
#[derive(Debug, Clone)]
pub struct MockContainer {
    pub name: String,
    pub service: String,
    pub running: bool,
}

#[derive(Debug)]
pub struct HostState {
    pub arch: Arch,
    pub runtime_ok: bool,
    pub registry_ok: bool,
    /// Display strings of images present in the host's image store.
    pub present_images: Vec<String>,
    pub listening: Vec<u16>,
    pub managed: Vec<u16>,
    pub containers: Vec<MockContainer>,
    pub files: BTreeMap<String, String>,
    /// Scripted probe answers, consumed front to back; when empty the
    /// probe answers `probe_default`.
    pub probe_script: Vec<bool>,
    pub probe_default: bool,
    /// Operation names forced to fail with a command error.
    pub fail_ops: Vec<&'static str>,
    /// Every call made, mutating or not, in order.
    pub calls: Vec<String>,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            arch: Arch::Amd64,
            runtime_ok: true,
            registry_ok: true,
            present_images: Vec::new(),
            listening: Vec::new(),
            managed: Vec::new(),
            containers: Vec::new(),
            files: BTreeMap::new(),
            probe_script: Vec::new(),
            probe_default: true,
            fail_ops: Vec::new(),
            calls: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MockHost {
    state: Mutex<HostState>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(f: impl FnOnce(&mut HostState)) -> Self {
        let host = Self::new();
        f(&mut host.state.lock());
        host
    }

    pub fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock()
    }

    pub fn container(&self, name: &str) -> Option<MockContainer> {
        self.state
            .lock()
            .containers
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    pub fn backup_containers(&self) -> Vec<String> {
        self.state
            .lock()
            .containers
            .iter()
            .filter(|c| is_backup_name(&c.name))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.state.lock().files.get(path).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Calls that change host state, as opposed to read-only probes.
    pub fn mutating_calls(&self) -> Vec<String> {
        const MUTATING: &[&str] = &[
            "stop", "start", "rename", "remove", "compose_up", "write", "copy",
        ];
        self.calls()
            .into_iter()
            .filter(|call| MUTATING.iter().any(|op| call.starts_with(op)))
            .collect()
    }

    fn check(&self, op: &'static str, detail: String) -> HostResult<()> {
        let mut state = self.state.lock();
        state.calls.push(detail);
        if state.fail_ops.contains(&op) {
            return Err(HostError::Command {
                context: op.to_string(),
                exit_code: 1,
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HostInfo for MockHost {
    async fn host_arch(&self) -> HostResult<Arch> {
        self.check("host_arch", "host_arch".to_string())?;
        Ok(self.state.lock().arch.clone())
    }

    async fn runtime_available(&self) -> HostResult<bool> {
        self.check("runtime_available", "runtime_available".to_string())?;
        Ok(self.state.lock().runtime_ok)
    }

    async fn registry_reachable(&self, registry: &str) -> HostResult<bool> {
        self.check("registry_reachable", format!("registry_reachable {registry}"))?;
        Ok(self.state.lock().registry_ok)
    }

    async fn image_present(&self, image: &ImageRef) -> HostResult<bool> {
        self.check("image_present", format!("image_present {image}"))?;
        Ok(self.state.lock().present_images.contains(&image.to_string()))
    }

    async fn listening_ports(&self) -> HostResult<Vec<u16>> {
        self.check("listening_ports", "listening_ports".to_string())?;
        Ok(self.state.lock().listening.clone())
    }
}

#[async_trait]
impl ContainerOps for MockHost {
    async fn service_containers(
        &self,
        project: &str,
        service: &ServiceName,
    ) -> HostResult<Vec<ContainerState>> {
        self.check(
            "service_containers",
            format!("service_containers {project}/{service}"),
        )?;
        Ok(self
            .state
            .lock()
            .containers
            .iter()
            .filter(|c| c.service == service.as_str())
            .map(|c| ContainerState {
                name: c.name.clone(),
                running: c.running,
            })
            .collect())
    }

    async fn managed_ports(&self, project: &str) -> HostResult<Vec<u16>> {
        self.check("managed_ports", format!("managed_ports {project}"))?;
        Ok(self.state.lock().managed.clone())
    }

    async fn stop_container(&self, name: &str) -> HostResult<()> {
        self.check("stop_container", format!("stop {name}"))?;
        let mut state = self.state.lock();
        match state.containers.iter_mut().find(|c| c.name == name) {
            Some(c) => {
                c.running = false;
                Ok(())
            }
            None => Err(no_such_container(name)),
        }
    }

    async fn start_container(&self, name: &str) -> HostResult<()> {
        self.check("start_container", format!("start {name}"))?;
        let mut state = self.state.lock();
        match state.containers.iter_mut().find(|c| c.name == name) {
            Some(c) => {
                c.running = true;
                Ok(())
            }
            None => Err(no_such_container(name)),
        }
    }

    async fn rename_container(&self, name: &str, new_name: &str) -> HostResult<()> {
        self.check("rename_container", format!("rename {name} -> {new_name}"))?;
        let mut state = self.state.lock();
        match state.containers.iter_mut().find(|c| c.name == name) {
            Some(c) => {
                c.name = new_name.to_string();
                Ok(())
            }
            None => Err(no_such_container(name)),
        }
    }

    async fn remove_container(&self, name: &str) -> HostResult<()> {
        self.check("remove_container", format!("remove {name}"))?;
        let mut state = self.state.lock();
        let before = state.containers.len();
        state.containers.retain(|c| c.name != name);
        if state.containers.len() == before {
            return Err(no_such_container(name));
        }
        Ok(())
    }

    // Honors the trait contract: parked backup containers are never touched
    // by a bring-up, only non-backup containers are created or started.
    async fn compose_up(
        &self,
        project: &str,
        _deploy_dir: &str,
        _compose_file: &str,
        services: &[ServiceName],
    ) -> HostResult<()> {
        let names: Vec<&str> = services.iter().map(|s| s.as_str()).collect();
        self.check("compose_up", format!("compose_up {}", names.join(",")))?;
        let mut state = self.state.lock();
        for service in services {
            let existing = state
                .containers
                .iter_mut()
                .find(|c| c.service == service.as_str() && !is_backup_name(&c.name));
            match existing {
                Some(c) => c.running = true,
                None => state.containers.push(MockContainer {
                    name: format!("{project}-{service}-1"),
                    service: service.as_str().to_string(),
                    running: true,
                }),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FileOps for MockHost {
    async fn file_exists(&self, path: &str) -> HostResult<bool> {
        self.check("file_exists", format!("file_exists {path}"))?;
        Ok(self.state.lock().files.contains_key(path))
    }

    async fn read_file(&self, path: &str) -> HostResult<String> {
        self.check("read_file", format!("read {path}"))?;
        self.state
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| HostError::Command {
                context: format!("cat {path}"),
                exit_code: 1,
                stderr: "No such file or directory".to_string(),
            })
    }

    async fn write_file(&self, path: &str, content: &str) -> HostResult<()> {
        self.check("write_file", format!("write {path}"))?;
        self.state
            .lock()
            .files
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn copy_file(&self, from: &str, to: &str) -> HostResult<()> {
        self.check("copy_file", format!("copy {from} -> {to}"))?;
        let mut state = self.state.lock();
        let content = state.files.get(from).cloned().ok_or_else(|| HostError::Command {
            context: format!("cp {from} {to}"),
            exit_code: 1,
            stderr: "No such file or directory".to_string(),
        })?;
        state.files.insert(to.to_string(), content);
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for MockHost {
    async fn probe(&self, port: u16, path: &str, _timeout: Duration) -> HostResult<bool> {
        self.check("probe", format!("probe {port}{path}"))?;
        let mut state = self.state.lock();
        if state.probe_script.is_empty() {
            Ok(state.probe_default)
        } else {
            Ok(state.probe_script.remove(0))
        }
    }
}

fn no_such_container(name: &str) -> HostError {
    HostError::Command {
        context: format!("docker inspect {name}"),
        exit_code: 1,
        stderr: "No such container".to_string(),
    }
}
