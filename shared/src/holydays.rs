//! Holy-day registry.
//!
//! Each holy day has a stable identifier (>= 100, used in the store key
//! `event:mass:holyday:<id>`), a canonical spoken name, the aliases Alexa
//! may hand us in the `massDay` slot, and a rule placing it in a given year.

use chrono::{Datelike, Duration, NaiveDate};

/// Where a holy day falls in a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    /// Same month/day every year
    Fixed { month: u32, day: u32 },
    /// Days relative to Easter Sunday
    Easter(i64),
    /// Epiphany, transferred to the Sunday between January 2 and 8
    Epiphany,
    /// Sunday after Epiphany, or the Monday when Epiphany is January 7 or 8
    BaptismOfTheLord,
    /// Sunday between November 20 and 26
    ChristTheKing,
}

/// A registered holy day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolyDay {
    pub id: u32,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub rule: DateRule,
}

/// Every holy day the skill recognises.
pub static HOLY_DAYS: &[HolyDay] = &[
    HolyDay {
        id: 100,
        name: "Solemnity of Mary, Mother of God",
        aliases: &[
            "mary mother of god",
            "solemnity of mary",
            "solemnity of mary mother of god",
            "new years day",
            "new years",
        ],
        rule: DateRule::Fixed { month: 1, day: 1 },
    },
    HolyDay {
        id: 101,
        name: "Epiphany",
        aliases: &["epiphany", "the epiphany", "epiphany of the lord"],
        rule: DateRule::Epiphany,
    },
    HolyDay {
        id: 102,
        name: "Baptism of the Lord",
        aliases: &["baptism of the lord", "baptism of our lord", "the baptism of the lord"],
        rule: DateRule::BaptismOfTheLord,
    },
    HolyDay {
        id: 103,
        name: "Ash Wednesday",
        aliases: &["ash wednesday"],
        rule: DateRule::Easter(-46),
    },
    HolyDay {
        id: 104,
        name: "Solemnity of Saint Joseph",
        aliases: &["saint joseph", "st joseph", "feast of saint joseph", "solemnity of saint joseph"],
        rule: DateRule::Fixed { month: 3, day: 19 },
    },
    HolyDay {
        id: 105,
        name: "Annunciation",
        aliases: &["annunciation", "the annunciation", "annunciation of the lord"],
        rule: DateRule::Fixed { month: 3, day: 25 },
    },
    HolyDay {
        id: 106,
        name: "Palm Sunday",
        aliases: &["palm sunday"],
        rule: DateRule::Easter(-7),
    },
    HolyDay {
        id: 107,
        name: "Holy Thursday",
        aliases: &["holy thursday", "maundy thursday"],
        rule: DateRule::Easter(-3),
    },
    HolyDay {
        id: 108,
        name: "Good Friday",
        aliases: &["good friday"],
        rule: DateRule::Easter(-2),
    },
    HolyDay {
        id: 109,
        name: "Easter Vigil",
        aliases: &["easter vigil", "holy saturday"],
        rule: DateRule::Easter(-1),
    },
    HolyDay {
        id: 110,
        name: "Easter Sunday",
        aliases: &["easter", "easter sunday"],
        rule: DateRule::Easter(0),
    },
    HolyDay {
        id: 111,
        name: "Divine Mercy Sunday",
        aliases: &["divine mercy sunday", "divine mercy"],
        rule: DateRule::Easter(7),
    },
    HolyDay {
        id: 112,
        name: "Ascension of the Lord",
        aliases: &["ascension", "ascension thursday", "ascension of the lord", "the ascension"],
        rule: DateRule::Easter(39),
    },
    HolyDay {
        id: 113,
        name: "Pentecost",
        aliases: &["pentecost", "pentecost sunday"],
        rule: DateRule::Easter(49),
    },
    HolyDay {
        id: 114,
        name: "Trinity Sunday",
        aliases: &["trinity sunday", "most holy trinity", "holy trinity"],
        rule: DateRule::Easter(56),
    },
    HolyDay {
        id: 115,
        name: "Corpus Christi",
        aliases: &["corpus christi", "body and blood of christ"],
        rule: DateRule::Easter(63),
    },
    HolyDay {
        id: 116,
        name: "Sacred Heart of Jesus",
        aliases: &["sacred heart", "sacred heart of jesus"],
        rule: DateRule::Easter(68),
    },
    HolyDay {
        id: 117,
        name: "Assumption",
        aliases: &["assumption", "the assumption", "assumption of mary", "assumption of the blessed virgin mary"],
        rule: DateRule::Fixed { month: 8, day: 15 },
    },
    HolyDay {
        id: 118,
        name: "All Saints Day",
        aliases: &["all saints", "all saints day"],
        rule: DateRule::Fixed { month: 11, day: 1 },
    },
    HolyDay {
        id: 119,
        name: "All Souls Day",
        aliases: &["all souls", "all souls day"],
        rule: DateRule::Fixed { month: 11, day: 2 },
    },
    HolyDay {
        id: 120,
        name: "Christ the King",
        aliases: &["christ the king", "feast of christ the king"],
        rule: DateRule::ChristTheKing,
    },
    HolyDay {
        id: 121,
        name: "Immaculate Conception",
        aliases: &["immaculate conception", "the immaculate conception"],
        rule: DateRule::Fixed { month: 12, day: 8 },
    },
    HolyDay {
        id: 122,
        name: "Christmas Eve",
        aliases: &["christmas eve"],
        rule: DateRule::Fixed { month: 12, day: 24 },
    },
    HolyDay {
        id: 123,
        name: "Christmas",
        aliases: &["christmas", "christmas day"],
        rule: DateRule::Fixed { month: 12, day: 25 },
    },
];

/// Lowercase, drop punctuation, collapse whitespace, spell out "st".
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '\'' | '’' | '.' | ',' | '!' | '?'))
        .flat_map(char::to_lowercase)
        .collect();

    cleaned
        .split_whitespace()
        .map(|word| if word == "st" { "saint" } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look up a holy day by spoken name.
pub fn find_by_name(spoken: &str) -> Option<&'static HolyDay> {
    let key = normalize(spoken);
    if key.is_empty() {
        return None;
    }
    HOLY_DAYS
        .iter()
        .find(|holy_day| holy_day.aliases.iter().any(|alias| normalize(alias) == key))
}

/// The holy day falling on `date`, if any.
pub fn on_date(date: NaiveDate) -> Option<&'static HolyDay> {
    HOLY_DAYS
        .iter()
        .find(|holy_day| holy_day.date_in(date.year()) == Some(date))
}

/// Look up a holy day by identifier.
pub fn find_by_id(id: u32) -> Option<&'static HolyDay> {
    HOLY_DAYS.iter().find(|holy_day| holy_day.id == id)
}

impl HolyDay {
    /// The date this holy day falls on in `year`.
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        match self.rule {
            DateRule::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            DateRule::Easter(offset) => easter_sunday(year).map(|easter| easter + Duration::days(offset)),
            DateRule::Epiphany => epiphany(year),
            DateRule::BaptismOfTheLord => {
                let epiphany = epiphany(year)?;
                if epiphany.day() >= 7 {
                    Some(epiphany + Duration::days(1))
                } else {
                    Some(epiphany + Duration::days(7))
                }
            }
            DateRule::ChristTheKing => {
                NaiveDate::from_ymd_opt(year, 11, 20).map(first_sunday_on_or_after)
            }
        }
    }

    /// Name as spoken mid-sentence ("the Ascension of the Lord").
    pub fn spoken_name(&self) -> String {
        let lower = self.name.to_lowercase();
        if ["solemnity", "ascension", "baptism"]
            .iter()
            .any(|prefix| lower.starts_with(prefix))
        {
            format!("the {}", self.name)
        } else {
            self.name.to_string()
        }
    }
}

/// Easter Sunday (Gregorian), by the anonymous Meeus/Jones/Butcher method.
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn epiphany(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 2).map(first_sunday_on_or_after)
}

fn first_sunday_on_or_after(date: NaiveDate) -> NaiveDate {
    let ahead = (7 - date.weekday().num_days_from_sunday()) % 7;
    date + Duration::days(ahead as i64)
}
