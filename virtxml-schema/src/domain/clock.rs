//! `<clock>`: guest time source and timers.

use serde::{Deserialize, Serialize};
use virtxml_marshal::{xml_enum, Cursor, Element, Fragment, Result};

use crate::types::YesNo;

xml_enum! {
    pub enum ClockBasis {
        Utc = "utc",
        Localtime = "localtime",
    }
}

xml_enum! {
    pub enum TimerName {
        Platform = "platform",
        Pit = "pit",
        Rtc = "rtc",
        Hpet = "hpet",
        Tsc = "tsc",
        Kvmclock = "kvmclock",
        Hypervclock = "hypervclock",
        Armvtimer = "armvtimer",
    }
}

xml_enum! {
    pub enum TickPolicy {
        Delay = "delay",
        Catchup = "catchup",
        Merge = "merge",
        Discard = "discard",
    }
}

xml_enum! {
    pub enum TimerTrack {
        Boot = "boot",
        Guest = "guest",
        Wall = "wall",
        Realtime = "realtime",
    }
}

xml_enum! {
    pub enum TimerMode {
        Auto = "auto",
        Native = "native",
        Emulate = "emulate",
        Paravirt = "paravirt",
        Smpsafe = "smpsafe",
    }
}

/// How the guest clock relates to the host clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockOffset {
    Utc,
    Localtime,
    Timezone(String),
    Variable {
        adjustment: i64,
        basis: Option<ClockBasis>,
    },
}

impl ClockOffset {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        c.choice()
            .or(|c| c.fixed_attribute("offset", "utc").map(|_| ClockOffset::Utc))
            .or(|c| c.fixed_attribute("offset", "localtime").map(|_| ClockOffset::Localtime))
            .or(|c| {
                c.fixed_attribute("offset", "timezone")?;
                Some(ClockOffset::Timezone(c.attribute("timezone")?))
            })
            .or(|c| {
                c.fixed_attribute("offset", "variable")?;
                Some(ClockOffset::Variable {
                    adjustment: c.attribute("adjustment")?,
                    basis: c.optional_attribute("basis")?,
                })
            })
            .select(c)
    }

    fn produce(&self, e: &mut Element) {
        match self {
            ClockOffset::Utc => e.put_fixed("offset", "utc"),
            ClockOffset::Localtime => e.put_fixed("offset", "localtime"),
            ClockOffset::Timezone(zone) => {
                e.put_fixed("offset", "timezone");
                e.put("timezone", zone);
            }
            ClockOffset::Variable { adjustment, basis } => {
                e.put_fixed("offset", "variable");
                e.put("adjustment", adjustment);
                e.put_optional("basis", basis);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub name: TimerName,
    pub present: Option<YesNo>,
    pub tick_policy: Option<TickPolicy>,
    pub track: Option<TimerTrack>,
    pub frequency: Option<u64>,
    pub mode: Option<TimerMode>,
}

impl Timer {
    pub fn new(name: TimerName) -> Self {
        Self {
            name,
            present: None,
            tick_policy: None,
            track: None,
            frequency: None,
            mode: None,
        }
    }
}

impl Fragment for Timer {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        Some(Self {
            name: c.attribute("name")?,
            present: c.optional_attribute("present")?,
            tick_policy: c.optional_attribute("tickpolicy")?,
            track: c.optional_attribute("track")?,
            frequency: c.optional_attribute("frequency")?,
            mode: c.optional_attribute("mode")?,
        })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        e.put("name", &self.name);
        e.put_optional("present", &self.present);
        e.put_optional("tickpolicy", &self.tick_policy);
        e.put_optional("track", &self.track);
        e.put_optional("frequency", &self.frequency);
        e.put_optional("mode", &self.mode);
        Ok(())
    }
}

/// `<clock>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    pub offset: ClockOffset,
    pub timers: Vec<Timer>,
}

impl Fragment for Clock {
    fn consume(c: &mut Cursor<'_>) -> Option<Self> {
        let offset = ClockOffset::consume(c)?;
        let timers = c.zero_or_more(|c| c.element("timer", Timer::consume));
        Some(Self { offset, timers })
    }

    fn produce(&self, e: &mut Element) -> Result<()> {
        self.offset.produce(e);
        e.push_all("timer", &self.timers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fragment;

    #[test]
    fn test_utc_with_timers() {
        let clock: Clock = fragment(
            "<clock offset='utc'>
               <timer name='rtc' tickpolicy='catchup'/>
               <timer name='pit' tickpolicy='delay'/>
               <timer name='hpet' present='no'/>
             </clock>",
        )
        .unwrap();
        assert_eq!(clock.offset, ClockOffset::Utc);
        assert_eq!(clock.timers.len(), 3);
        assert_eq!(clock.timers[2].present, Some(YesNo::No));
    }

    #[test]
    fn test_variable_offset() {
        let clock: Clock = fragment("<clock offset='variable' adjustment='-3600' basis='localtime'/>").unwrap();
        assert_eq!(
            clock.offset,
            ClockOffset::Variable {
                adjustment: -3600,
                basis: Some(ClockBasis::Localtime)
            }
        );
    }

    #[test]
    fn test_timezone_requires_zone() {
        assert!(fragment::<Clock>("<clock offset='timezone'/>").is_none());
        let clock: Clock = fragment("<clock offset='timezone' timezone='Europe/Paris'/>").unwrap();
        assert_eq!(clock.offset, ClockOffset::Timezone("Europe/Paris".to_string()));
    }
}
