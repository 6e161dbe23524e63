//! Golfzon County club table
//!
//! Maps the club names shown on the service to their `golfclubSeq` codes.

use crate::error::Error;

/// A club served by the reservation service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Club {
    pub name: &'static str,
    pub seq: &'static str,
    pub region: &'static str,
}

/// Known clubs, grouped by region
pub const CLUBS: &[Club] = &[
    Club { name: "이글몬트", seq: "64", region: "경기도" },
    Club { name: "안성H", seq: "53", region: "경기도" },
    Club { name: "안성W", seq: "2", region: "경기도" },
    Club { name: "송도", seq: "68", region: "경기도" },
    Club { name: "진천", seq: "4", region: "충청" },
    Club { name: "화랑", seq: "52", region: "충청" },
    Club { name: "감포cc", seq: "1", region: "경상" },
    Club { name: "경남", seq: "49", region: "경상" },
    Club { name: "사천", seq: "56", region: "경상" },
    Club { name: "더골프", seq: "61", region: "경상" },
    Club { name: "구미", seq: "50", region: "경상" },
    Club { name: "청통", seq: "58", region: "경상" },
    Club { name: "선산", seq: "28", region: "경상" },
    Club { name: "영암45", seq: "59", region: "전라" },
    Club { name: "드래곤", seq: "55", region: "전라" },
    Club { name: "순천", seq: "57", region: "전라" },
    Club { name: "선운", seq: "5", region: "전라" },
    Club { name: "무주", seq: "54", region: "전라" },
    Club { name: "제주오라", seq: "3", region: "제주" },
];

/// Resolve a club given either its name or its numeric sequence code
///
/// Numeric input is accepted as-is so clubs missing from the table can still
/// be targeted.
pub fn resolve_club(input: &str) -> Result<String, Error> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::config("club cannot be empty"));
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        return Ok(input.to_string());
    }

    CLUBS
        .iter()
        .find(|club| club.name.eq_ignore_ascii_case(input))
        .map(|club| club.seq.to_string())
        .ok_or_else(|| Error::config(format!("unknown club '{input}'")))
}

/// Look up a club's display name from its sequence code
pub fn club_name(seq: &str) -> Option<&'static str> {
    CLUBS.iter().find(|club| club.seq == seq).map(|club| club.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_name() {
        assert_eq!(resolve_club("감포cc").unwrap(), "1");
        assert_eq!(resolve_club("감포CC").unwrap(), "1");
        assert_eq!(resolve_club("제주오라").unwrap(), "3");
    }

    #[test]
    fn test_resolve_numeric_passthrough() {
        assert_eq!(resolve_club("64").unwrap(), "64");
        assert_eq!(resolve_club("999").unwrap(), "999");
    }

    #[test]
    fn test_resolve_unknown() {
        assert!(resolve_club("없는골프장").is_err());
        assert!(resolve_club("  ").is_err());
    }

    #[test]
    fn test_seq_codes_are_unique() {
        let mut seqs: Vec<_> = CLUBS.iter().map(|c| c.seq).collect();
        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), CLUBS.len());
        assert_eq!(club_name("53"), Some("안성H"));
    }
}
