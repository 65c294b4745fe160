use std::collections::{BTreeSet, HashMap};

/// Top GCP zones, one per continent. They take the first indices so that a
/// 3-bit cluster id still covers every continent.
const GCP_TOP_REGION_ZONES: &[(&str, &[&str])] = &[
    ("africa-south1", &["a"]),
    ("asia-northeast1", &["a"]),
    ("asia-south2", &["a"]),
    ("australia-southeast2", &["a"]),
    ("europe-north1", &["a"]),
    ("me-west1", &["a"]),
    ("southamerica-east1", &["a"]),
    ("us-central1", &["a"]),
];

/// GCP regions and their zone letters.
const GCP_REGION_ZONES: &[(&str, &[&str])] = &[
    // Africa
    ("africa-south1", &["a", "b", "c"]),
    // Asia
    ("asia-east1", &["a", "b", "c"]),
    ("asia-east2", &["a", "b", "c"]),
    ("asia-northeast1", &["a", "b", "c"]),
    ("asia-northeast2", &["a", "b", "c"]),
    ("asia-northeast3", &["a", "b", "c"]),
    ("asia-south1", &["a", "b", "c"]),
    ("asia-south2", &["a", "b", "c"]),
    ("asia-southeast1", &["a", "b", "c"]),
    ("asia-southeast2", &["a", "b", "c"]),
    // Australia
    ("australia-southeast1", &["a", "b", "c"]),
    ("australia-southeast2", &["a", "b", "c"]),
    // Europe
    ("europe-central2", &["a", "b", "c"]),
    ("europe-north1", &["a", "b", "c"]),
    ("europe-north2", &["a", "b", "c"]),
    ("europe-southwest1", &["a", "b", "c"]),
    ("europe-west1", &["b", "c", "d"]),
    ("europe-west10", &["a", "b", "c"]),
    ("europe-west12", &["a", "b", "c"]),
    ("europe-west2", &["a", "b", "c"]),
    ("europe-west3", &["a", "b", "c"]),
    ("europe-west4", &["a", "b", "c"]),
    ("europe-west6", &["a", "b", "c"]),
    ("europe-west8", &["a", "b", "c"]),
    ("europe-west9", &["a", "b", "c"]),
    // Middle East
    ("me-central1", &["a", "b", "c"]),
    ("me-central2", &["a", "b", "c"]),
    ("me-west1", &["a", "b", "c"]),
    // North America
    ("northamerica-northeast1", &["a", "b", "c"]),
    ("northamerica-northeast2", &["a", "b", "c"]),
    ("northamerica-south1", &["a", "b", "c"]),
    ("us-central1", &["a", "b", "c", "f"]),
    ("us-east1", &["b", "c", "d"]),
    ("us-east4", &["a", "b", "c"]),
    ("us-east5", &["a", "b", "c"]),
    ("us-south1", &["a", "b", "c"]),
    ("us-west1", &["a", "b", "c"]),
    ("us-west2", &["a", "b", "c"]),
    ("us-west3", &["a", "b", "c"]),
    ("us-west4", &["a", "b", "c"]),
    // South America
    ("southamerica-east1", &["a", "b", "c"]),
    ("southamerica-west1", &["a", "b", "c"]),
];

/// Top AWS regions, spread across continents.
const AWS_TOP_REGIONS: &[&str] = &[
    "ap-southeast-2",
    "eu-west-2",
    "us-west-1",
    "ap-east-1",
    "af-south-1",
    "sa-east-1",
    "me-central-1",
    "ca-central-1",
];

const AWS_REGIONS: &[&str] = &[
    "af-south-1",
    "ap-east-1",
    "ap-east-2",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-southeast-5",
    "ap-southeast-6",
    "ap-southeast-7",
    "ca-central-1",
    "ca-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-north-1",
    "eu-south-1",
    "eu-south-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "il-central-1",
    "me-central-1",
    "me-south-1",
    "mx-central-1",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
];

/// An immutable mapping from location names (zones or regions) to dense,
/// stable indices.
///
/// Indices are assigned deterministically: the "top" names that exist in the
/// full set come first in sorted order, then every remaining name in sorted
/// order. Adding a name to the data can shift the indices of names sorted
/// after it, so all instances sharing a layout must agree on the table.
///
/// ```
/// use kubeflake_discovery::ZoneIndex;
///
/// let index = ZoneIndex::build(["c", "a"], ["a", "b", "c", "d"]);
/// assert_eq!(index.get("a"), Some(0));
/// assert_eq!(index.get("c"), Some(1));
/// assert_eq!(index.get("b"), Some(2));
/// assert_eq!(index.get("d"), Some(3));
/// assert_eq!(index.get("e"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneIndex {
    indices: HashMap<String, u64>,
}

impl ZoneIndex {
    /// Builds an index over `all`, with the members of `top` first.
    ///
    /// Names in `top` that are not in `all` are ignored; duplicates collapse.
    pub fn build<'a>(
        top: impl IntoIterator<Item = &'a str>,
        all: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let all: BTreeSet<&str> = all.into_iter().collect();
        let top: BTreeSet<&str> = top.into_iter().filter(|n| all.contains(n)).collect();
        let rest = all.iter().filter(|n| !top.contains(*n));

        let indices = top
            .iter()
            .chain(rest)
            .zip(0..)
            .map(|(name, index)| ((*name).to_owned(), index))
            .collect();
        Self { indices }
    }

    /// GCP zones (`<region>-<letter>`).
    pub fn gcp_zones() -> Self {
        let top = expand(GCP_TOP_REGION_ZONES);
        let all = expand(GCP_REGION_ZONES);
        Self::build(top.iter().map(String::as_str), all.iter().map(String::as_str))
    }

    /// GCP regions.
    pub fn gcp_regions() -> Self {
        Self::build(
            GCP_TOP_REGION_ZONES.iter().map(|(region, _)| *region),
            GCP_REGION_ZONES.iter().map(|(region, _)| *region),
        )
    }

    /// AWS regions.
    pub fn aws_regions() -> Self {
        Self::build(AWS_TOP_REGIONS.iter().copied(), AWS_REGIONS.iter().copied())
    }

    /// The index of `name`, if known.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.indices.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Names in index order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<(&str, u64)> = self
            .indices
            .iter()
            .map(|(name, &index)| (name.as_str(), index))
            .collect();
        names.sort_unstable_by_key(|&(_, index)| index);
        names.into_iter().map(|(name, _)| name).collect()
    }
}

fn expand(region_zones: &[(&str, &[&str])]) -> Vec<String> {
    region_zones
        .iter()
        .flat_map(|(region, letters)| letters.iter().map(move |l| format!("{region}-{l}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcp_top_zones_take_first_indices() {
        let index = ZoneIndex::gcp_zones();
        let names = index.names();
        assert_eq!(
            &names[..8],
            [
                "africa-south1-a",
                "asia-northeast1-a",
                "asia-south2-a",
                "australia-southeast2-a",
                "europe-north1-a",
                "me-west1-a",
                "southamerica-east1-a",
                "us-central1-a",
            ]
        );
        // then all remaining zones sorted, skipping the ones already placed
        assert_eq!(index.get("africa-south1-b"), Some(8));
        assert_eq!(index.get("africa-south1-c"), Some(9));
        assert_eq!(index.get("asia-east1-a"), Some(10));
    }

    #[test]
    fn gcp_zones_cover_every_letter() {
        let index = ZoneIndex::gcp_zones();
        let expected: usize = GCP_REGION_ZONES.iter().map(|(_, l)| l.len()).sum();
        assert_eq!(index.len(), expected);
        assert!(index.get("europe-west1-a").is_none());
        assert!(index.get("europe-west1-d").is_some());
        assert!(index.get("us-central1-f").is_some());
        assert!(index.get("us-east1-a").is_none());
        // indices are dense
        let mut all: Vec<u64> = index.names().iter().filter_map(|n| index.get(n)).collect();
        all.sort_unstable();
        assert_eq!(all, (0..expected as u64).collect::<Vec<_>>());
    }

    #[test]
    fn gcp_regions_sorted_with_top_first() {
        let index = ZoneIndex::gcp_regions();
        assert_eq!(index.len(), GCP_REGION_ZONES.len());
        assert_eq!(index.get("africa-south1"), Some(0));
        assert_eq!(index.get("us-central1"), Some(7));
        assert_eq!(index.get("asia-east1"), Some(8));
    }

    #[test]
    fn aws_regions_sorted_with_top_first() {
        let index = ZoneIndex::aws_regions();
        assert_eq!(index.len(), AWS_REGIONS.len());
        assert_eq!(
            &index.names()[..8],
            [
                "af-south-1",
                "ap-east-1",
                "ap-southeast-2",
                "ca-central-1",
                "eu-west-2",
                "me-central-1",
                "sa-east-1",
                "us-west-1",
            ]
        );
        assert_eq!(index.get("ap-east-2"), Some(8));
        assert_eq!(index.get("us-west-2"), Some(AWS_REGIONS.len() as u64 - 1));
    }

    #[test]
    fn unknown_top_names_are_ignored() {
        let index = ZoneIndex::build(["zz", "b", "b"], ["a", "b"]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("b"), Some(0));
        assert_eq!(index.get("a"), Some(1));
        assert_eq!(index.get("zz"), None);
    }

    #[test]
    fn building_twice_is_stable() {
        assert_eq!(ZoneIndex::gcp_zones(), ZoneIndex::gcp_zones());
        assert_eq!(ZoneIndex::aws_regions(), ZoneIndex::aws_regions());
    }
}
