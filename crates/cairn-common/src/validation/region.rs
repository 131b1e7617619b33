//! Region inference from zone names
//!
//! Cairn does not know how a provider maps zones to regions. The only
//! supported convention is the one used by AWS-style zone names, and it is
//! opt-in: validation treats region coherence as satisfied unless a caller
//! selects [`RegionInference::ZoneSuffix`].

/// How to derive a region from a zone name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegionInference {
    /// Do not infer regions; region coherence always passes
    #[default]
    Disabled,
    /// The region is the zone name minus one trailing lowercase letter that
    /// follows a digit (`us-east-1a` is in `us-east-1`)
    ZoneSuffix,
}

impl RegionInference {
    /// Returns true if regions are inferred at all
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Region of `zone`, or `None` if the zone does not follow the convention
    /// (always `None` when disabled)
    pub fn region_of<'a>(&self, zone: &'a str) -> Option<&'a str> {
        match self {
            Self::Disabled => None,
            Self::ZoneSuffix => {
                let bytes = zone.as_bytes();
                let [.., digit, letter] = bytes else {
                    return None;
                };
                if letter.is_ascii_lowercase() && digit.is_ascii_digit() {
                    Some(&zone[..zone.len() - 1])
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::aws_zone("us-east-1a", Some("us-east-1"))]
    #[case::mock_zone("us-mock-1c", Some("us-mock-1"))]
    #[case::region_given_as_zone("us-mock-1", None)]
    #[case::no_digit("europe-west", None)]
    #[case::uppercase_suffix("us-east-1A", None)]
    #[case::too_short("a", None)]
    #[case::empty("", None)]
    fn zone_suffix_inference(#[case] zone: &str, #[case] expected: Option<&str>) {
        assert_eq!(RegionInference::ZoneSuffix.region_of(zone), expected);
    }

    #[test]
    fn disabled_never_infers() {
        assert!(!RegionInference::Disabled.is_enabled());
        assert_eq!(RegionInference::Disabled.region_of("us-east-1a"), None);
        assert_eq!(RegionInference::default(), RegionInference::Disabled);
    }
}
