// ABOUTME: SSH-backed implementation of the remote host traits.
// ABOUTME: Every action is a fixed script; values enter only via `quoted`.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Empty;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::time::Duration;

use super::error::{HostError, HostResult};
use super::script::quoted;
use super::traits::{ContainerOps, ContainerState, FileOps, HealthProbe, HostInfo};
use crate::ssh::{CommandOutput, Session};
use crate::types::{Arch, ImageRef, ServiceName};

/// The remote host, reached over one persistent SSH session.
pub struct SshHost {
    session: Session,
}

impl SshHost {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Raw session access for streaming transfers.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn disconnect(self) -> HostResult<()> {
        self.session.disconnect().await?;
        Ok(())
    }

    async fn run(&self, context: &str, script: &str) -> HostResult<CommandOutput> {
        tracing::debug!(context, "remote: {script}");
        let output = self.session.exec(script).await?;
        if !output.success() {
            return Err(HostError::Command {
                context: context.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Run a script where a non-zero exit is an answer, not a failure.
    async fn run_check(&self, script: &str) -> HostResult<bool> {
        let output = self.session.exec(script).await?;
        Ok(output.success())
    }
}

#[async_trait]
impl HostInfo for SshHost {
    async fn host_arch(&self) -> HostResult<Arch> {
        let output = self.run("host architecture", "uname -m").await?;
        let raw = output.stdout.trim();
        if raw.is_empty() {
            return Err(HostError::Unparseable {
                what: "host architecture".to_string(),
                raw: output.stdout,
            });
        }
        Ok(Arch::normalize(raw))
    }

    async fn runtime_available(&self) -> HostResult<bool> {
        self.run_check("docker info >/dev/null 2>&1 && docker compose version >/dev/null 2>&1")
            .await
    }

    async fn registry_reachable(&self, registry: &str) -> HostResult<bool> {
        // Any HTTP response counts, including 401 from an auth-requiring
        // registry; only no-response-at-all is unreachable.
        let script = format!(
            "curl -sS --max-time 5 -o /dev/null -w '%{{http_code}}' {}",
            quoted(&format!("https://{}/v2/", registry))
        );
        let output = self.session.exec(&script).await?;
        Ok(output.success() && output.stdout.trim() != "000")
    }

    async fn image_present(&self, image: &ImageRef) -> HostResult<bool> {
        let script = format!(
            "docker image inspect {} >/dev/null 2>&1",
            quoted(&image.to_string())
        );
        self.run_check(&script).await
    }

    async fn listening_ports(&self) -> HostResult<Vec<u16>> {
        let output = self.run("listening ports", "ss -ltnH").await?;
        Ok(parse_listening_ports(&output.stdout))
    }
}

#[async_trait]
impl ContainerOps for SshHost {
    async fn service_containers(
        &self,
        project: &str,
        service: &ServiceName,
    ) -> HostResult<Vec<ContainerState>> {
        let script = format!(
            "docker ps -a --filter label=com.docker.compose.project={} \
             --filter label=com.docker.compose.service={} \
             --format '{{{{.Names}}}}\t{{{{.State}}}}'",
            quoted(project),
            quoted(service.as_str())
        );
        let output = self.run("list service containers", &script).await?;
        Ok(parse_container_states(&output.stdout))
    }

    async fn managed_ports(&self, project: &str) -> HostResult<Vec<u16>> {
        let script = format!(
            "docker ps --filter label=com.docker.compose.project={} --format '{{{{.Ports}}}}'",
            quoted(project)
        );
        let output = self.run("managed ports", &script).await?;
        Ok(parse_published_ports(&output.stdout))
    }

    async fn stop_container(&self, name: &str) -> HostResult<()> {
        self.run(
            "stop container",
            &format!("docker stop {}", quoted(name)),
        )
        .await?;
        Ok(())
    }

    async fn start_container(&self, name: &str) -> HostResult<()> {
        self.run(
            "start container",
            &format!("docker start {}", quoted(name)),
        )
        .await?;
        Ok(())
    }

    async fn rename_container(&self, name: &str, new_name: &str) -> HostResult<()> {
        self.run(
            "rename container",
            &format!("docker rename {} {}", quoted(name), quoted(new_name)),
        )
        .await?;
        Ok(())
    }

    async fn remove_container(&self, name: &str) -> HostResult<()> {
        self.run(
            "remove container",
            &format!("docker rm -f {}", quoted(name)),
        )
        .await?;
        Ok(())
    }

    async fn compose_up(
        &self,
        project: &str,
        deploy_dir: &str,
        compose_file: &str,
        services: &[ServiceName],
    ) -> HostResult<()> {
        let names: Vec<String> = services.iter().map(|s| quoted(s.as_str())).collect();
        // Compose tracks containers by project/service labels, which survive
        // a rename, so a parked backup is still in convergence scope. The
        // script snapshots the parked set before and after and turns any
        // consumed backup into a bring-up failure instead of a silent loss.
        let script = format!(
            "cd {dir} || exit 1\n\
             before=$(docker ps -aq --filter label=com.docker.compose.project={project} --filter name=-backup- | sort)\n\
             docker compose -p {project} -f {file} up -d {services} || exit 1\n\
             after=$(docker ps -aq --filter label=com.docker.compose.project={project} --filter name=-backup- | sort)\n\
             if [ \"$before\" != \"$after\" ]; then\n\
               echo 'parked backup containers were disturbed during bring-up' >&2\n\
               exit 70\n\
             fi",
            dir = quoted(deploy_dir),
            project = quoted(project),
            file = quoted(compose_file),
            services = names.join(" ")
        );
        self.run("compose up", &script).await?;
        Ok(())
    }
}

#[async_trait]
impl FileOps for SshHost {
    async fn file_exists(&self, path: &str) -> HostResult<bool> {
        self.run_check(&format!("test -e {}", quoted(path))).await
    }

    async fn read_file(&self, path: &str) -> HostResult<String> {
        let output = self
            .run("read file", &format!("cat {}", quoted(path)))
            .await?;
        Ok(output.stdout)
    }

    async fn write_file(&self, path: &str, content: &str) -> HostResult<()> {
        // Content goes over stdin, never inside the script body.
        let script = format!("cat > {}", quoted(path));
        let output = self
            .session
            .exec_with_input(&script, content.as_bytes())
            .await?;
        if !output.success() {
            return Err(HostError::Command {
                context: "write file".to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    async fn copy_file(&self, from: &str, to: &str) -> HostResult<()> {
        self.run(
            "copy file",
            &format!("cp -p {} {}", quoted(from), quoted(to)),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for SshHost {
    async fn probe(&self, port: u16, path: &str, timeout: Duration) -> HostResult<bool> {
        match tokio::time::timeout(timeout, self.probe_once(port, path)).await {
            Ok(Ok(healthy)) => Ok(healthy),
            // Refused tunnels and broken requests are normal while the
            // service is still coming up; the attempt budget decides.
            Ok(Err(reason)) => {
                tracing::debug!("health probe attempt failed: {reason}");
                Ok(false)
            }
            Err(_elapsed) => Ok(false),
        }
    }
}

impl SshHost {
    async fn probe_once(&self, port: u16, path: &str) -> Result<bool, String> {
        let stream = self
            .session
            .open_tunnel(port)
            .await
            .map_err(|e| e.to_string())?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| e.to_string())?;
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let request = Request::builder()
            .uri(path)
            .header(hyper::header::HOST, "localhost")
            .body(Empty::<Bytes>::new())
            .map_err(|e| e.to_string())?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        Ok(!status.is_client_error() && !status.is_server_error())
    }
}

/// Parse `ss -ltnH` output into listening host ports.
fn parse_listening_ports(output: &str) -> Vec<u16> {
    let mut ports = Vec::new();
    for line in output.lines() {
        let columns: Vec<&str> = line.split_whitespace().collect();
        // LISTEN lines: State Recv-Q Send-Q Local-Address:Port Peer ...
        let local = match columns.get(3) {
            Some(l) => l,
            None => continue,
        };
        if let Some(port) = local.rsplit(':').next().and_then(|p| p.parse().ok())
            && !ports.contains(&port)
        {
            ports.push(port);
        }
    }
    ports
}

/// Parse `docker ps --format '{{.Ports}}'` lines into published host ports.
fn parse_published_ports(output: &str) -> Vec<u16> {
    let mut ports = Vec::new();
    for line in output.lines() {
        for mapping in line.split(',') {
            // e.g. "0.0.0.0:8080->8080/tcp" — unpublished ports have no "->"
            let Some((host_side, _)) = mapping.trim().split_once("->") else {
                continue;
            };
            if let Some(port) = host_side.rsplit(':').next().and_then(|p| p.parse().ok())
                && !ports.contains(&port)
            {
                ports.push(port);
            }
        }
    }
    ports
}

/// Parse `docker ps -a --format '{{.Names}}\t{{.State}}'` lines.
fn parse_container_states(output: &str) -> Vec<ContainerState> {
    output
        .lines()
        .filter_map(|line| {
            let (name, state) = line.split_once('\t')?;
            if name.is_empty() {
                return None;
            }
            Some(ContainerState {
                name: name.to_string(),
                running: state.trim() == "running",
            })
        })
        .collect()
}
