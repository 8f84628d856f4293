use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Transport used to reach the server process
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Transport {
    /// Framed messages over the child's stdin/stdout pair
    #[default]
    Stdio,
    /// HTTP event-stream endpoint exposed by the child
    Sse { url: String },
}

/// Configuration for one server connection: the command to launch and the
/// transport to speak to it over.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into, strip_option))]
pub struct RunnerConfig {
    /// Client name reported during the protocol handshake
    pub name: String,
    /// Client version reported during the protocol handshake
    pub version: String,
    /// Executable to launch
    pub command: String,
    #[serde(default)]
    #[builder(default)]
    #[builder(setter(custom))]
    pub args: Vec<String>,
    #[serde(default)]
    #[builder(default)]
    #[builder(setter(custom))]
    pub env: HashMap<String, String>,
    #[serde(default)]
    #[builder(default)]
    pub transport: Transport,
    #[serde(default)]
    #[builder(default)]
    pub working_directory: Option<PathBuf>,
}

impl RunnerConfig {
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.command.trim().is_empty() {
            return Err(anyhow::anyhow!("command must not be empty"));
        }

        if let Transport::Sse { url } = &self.transport {
            if url.trim().is_empty() {
                return Err(anyhow::anyhow!("SSE transport requires a url"));
            }
        }

        Ok(())
    }
}

impl RunnerConfigBuilder {
    pub fn args<S: ToString, I: IntoIterator<Item = S>>(&mut self, iter: I) -> &mut Self {
        let args: Vec<String> = iter.into_iter().map(|s| s.to_string()).collect();
        self.args = Some(args);
        self
    }

    pub fn env<T: ToString>(&mut self, key: T, value: T) -> &mut Self {
        let map = self.env.get_or_insert_with(HashMap::new);
        map.insert(key.to_string(), value.to_string());

        self
    }

    pub fn env_multi<T: ToString, I: IntoIterator<Item = (T, T)>>(&mut self, iter: I) -> &mut Self {
        let env = self.env.get_or_insert_with(HashMap::new);
        for (key, value) in iter {
            env.insert(key.to_string(), value.to_string());
        }
        self
    }
}
