//! Channel membership types.

/// A member's mode on a channel.
///
/// Op subsumes the half-op, op, admin, and owner sigils; `+` is voice; no
/// sigil is normal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberMode {
    /// No sigil.
    #[default]
    Normal,
    /// `+`
    Voice,
    /// `%`, `@`, `&`, or `~`
    Op,
}

impl MemberMode {
    /// Map a NAMES-style sigil to a mode, if it is one.
    pub fn from_sigil(c: char) -> Option<MemberMode> {
        match c {
            '+' => Some(MemberMode::Voice),
            '%' | '@' | '&' | '~' => Some(MemberMode::Op),
            _ => None,
        }
    }
}

/// One nick's presence on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMember {
    /// The member's nick, sigil stripped.
    pub nick: String,
    /// The member's mode.
    pub mode: MemberMode,
}

impl ChannelMember {
    /// Build a member from a possibly sigil-prefixed nick as it appears in
    /// a NAMES reply.
    pub fn from_sigiled(raw: &str) -> ChannelMember {
        let mut chars = raw.chars();
        match chars.next().and_then(MemberMode::from_sigil) {
            Some(mode) => ChannelMember {
                nick: chars.as_str().to_string(),
                mode,
            },
            None => ChannelMember {
                nick: raw.to_string(),
                mode: MemberMode::Normal,
            },
        }
    }
}
