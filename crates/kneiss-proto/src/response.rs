//! IRC numeric replies used by a chat client.
//!
//! Only the subset a Twitch-style chat server sends during registration and
//! channel joins is modelled. Other numerics are still parsed as messages;
//! [`Response::from_code`] just returns `None` for them.

#![allow(non_camel_case_types)]

use std::fmt;

/// IRC server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    /// 001 - Welcome to the IRC network
    RPL_WELCOME = 1,
    /// 002 - Your host is running version
    RPL_YOURHOST = 2,
    /// 003 - Server creation date
    RPL_CREATED = 3,
    /// 004 - Server info
    RPL_MYINFO = 4,
    /// 353 - Names reply
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES list
    RPL_ENDOFNAMES = 366,
    /// 372 - MOTD line
    RPL_MOTD = 372,
    /// 375 - Start of MOTD
    RPL_MOTDSTART = 375,
    /// 376 - End of MOTD
    RPL_ENDOFMOTD = 376,
    /// 421 - Unknown command
    ERR_UNKNOWNCOMMAND = 421,
}

impl Response {
    /// Get the numeric code.
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Creates a Response from a numeric code.
    pub fn from_code(code: u16) -> Option<Response> {
        let resp = match code {
            1 => Self::RPL_WELCOME,
            2 => Self::RPL_YOURHOST,
            3 => Self::RPL_CREATED,
            4 => Self::RPL_MYINFO,
            353 => Self::RPL_NAMREPLY,
            366 => Self::RPL_ENDOFNAMES,
            372 => Self::RPL_MOTD,
            375 => Self::RPL_MOTDSTART,
            376 => Self::RPL_ENDOFMOTD,
            421 => Self::ERR_UNKNOWNCOMMAND,
            _ => return None,
        };
        Some(resp)
    }

    /// The three-digit wire form, used as the command string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RPL_WELCOME => "001",
            Self::RPL_YOURHOST => "002",
            Self::RPL_CREATED => "003",
            Self::RPL_MYINFO => "004",
            Self::RPL_NAMREPLY => "353",
            Self::RPL_ENDOFNAMES => "366",
            Self::RPL_MOTD => "372",
            Self::RPL_MOTDSTART => "375",
            Self::RPL_ENDOFMOTD => "376",
            Self::ERR_UNKNOWNCOMMAND => "421",
        }
    }

    /// Check if this is an error response (4xx, 5xx).
    #[inline]
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
