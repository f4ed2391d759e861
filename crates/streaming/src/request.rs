/// Identifies one grid load request.
///
/// Ids are handed out in increasing order by `LoadPipeline`, so a larger id
/// always means a more recent request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Request(pub u64);
