use std::fmt;

/// Channel names the execution service is known to accept.
pub const KNOWN_RUNTIME_CHANNELS: [&str; 3] =
    ["ibm_quantum_platform", "ibm_cloud", "ibm_quantum"];

/// Runtime channel selection. `Auto` lets the service try channels in its
/// own preference order and is sent as an absent field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RuntimeChannel {
    #[default]
    Auto,
    Named(String),
}

impl RuntimeChannel {
    /// Blank input and the literal `auto` (any case) both mean [`Self::Auto`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            RuntimeChannel::Auto
        } else {
            RuntimeChannel::Named(trimmed.to_string())
        }
    }

    pub fn from_wire(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    /// Value sent on the wire; `None` for [`Self::Auto`].
    pub fn as_wire(&self) -> Option<&str> {
        match self {
            RuntimeChannel::Auto => None,
            RuntimeChannel::Named(name) => Some(name.as_str()),
        }
    }

    pub fn is_known(&self) -> bool {
        match self {
            RuntimeChannel::Auto => true,
            RuntimeChannel::Named(name) => {
                KNOWN_RUNTIME_CHANNELS.contains(&name.as_str())
            }
        }
    }
}

impl fmt::Display for RuntimeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeChannel::Auto => f.write_str("auto"),
            RuntimeChannel::Named(name) => f.write_str(name),
        }
    }
}

/// The runtime-selection inputs a job was submitted with. These are the
/// values persisted for resume, not whatever the service reported using.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeSelection {
    pub channel: RuntimeChannel,
    pub instance: Option<String>,
}

impl RuntimeSelection {
    pub fn new(channel: RuntimeChannel, instance: Option<String>) -> Self {
        Self {
            channel,
            instance: normalize_optional(instance),
        }
    }

    pub fn from_wire(channel: Option<&str>, instance: Option<&str>) -> Self {
        Self::new(
            RuntimeChannel::from_wire(channel),
            instance.map(str::to_string),
        )
    }

    pub fn channel_wire(&self) -> Option<String> {
        self.channel.as_wire().map(str::to_string)
    }

    pub fn instance_wire(&self) -> Option<String> {
        self.instance.clone()
    }
}

/// Trim an optional string field; blank input becomes `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_channel_is_omitted_on_the_wire() {
        assert_eq!(RuntimeChannel::parse(" AUTO ").as_wire(), None);
        assert_eq!(RuntimeChannel::parse("").as_wire(), None);
        assert_eq!(
            RuntimeChannel::parse(" ibm_cloud ").as_wire(),
            Some("ibm_cloud")
        );
    }

    #[test]
    fn blank_instance_becomes_none() {
        let selection =
            RuntimeSelection::new(RuntimeChannel::Auto, Some("   ".into()));
        assert_eq!(selection.instance, None);

        let selection = RuntimeSelection::from_wire(
            Some("ibm_cloud"),
            Some("  hub/group/project  "),
        );
        assert_eq!(selection.instance.as_deref(), Some("hub/group/project"));
        assert!(selection.channel.is_known());
    }
}
