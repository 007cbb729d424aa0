use std::path::PathBuf;

/// Rendering resolution, restricted to the values the normalization tool
/// accepts. Anything else is a validation error at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dpi {
    Dpi300,
    #[default]
    Dpi600,
    Dpi1200,
}

impl Dpi {
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            300 => Some(Dpi::Dpi300),
            600 => Some(Dpi::Dpi600),
            1200 => Some(Dpi::Dpi1200),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Dpi::Dpi300 => 300,
            Dpi::Dpi600 => 600,
            Dpi::Dpi1200 => 1200,
        }
    }
}

/// Which pages the normalization step should process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Range(u32, u32),
    List(Vec<u32>),
}

impl PageSelection {
    /// Parses `"all"`, a range like `"3-7"`, or a comma-separated list like
    /// `"1,3,7"`. Page numbers are 1-based.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let spec = spec.trim();
        if spec.is_empty() || spec.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = spec.split_once('-') {
            let start = parse_page(start)?;
            let end = parse_page(end)?;
            if start > end {
                return Err(format!("range start {} is after end {}", start, end));
            }
            return Ok(PageSelection::Range(start, end));
        }

        let pages = spec
            .split(',')
            .map(parse_page)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageSelection::List(pages))
    }

    /// Renders the selection as the argument the normalization tool expects:
    /// `all`, `start-end`, or space-separated page numbers.
    pub fn to_tool_arg(&self) -> String {
        match self {
            PageSelection::All => "all".to_string(),
            PageSelection::Range(start, end) => format!("{}-{}", start, end),
            PageSelection::List(pages) => pages
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl Default for PageSelection {
    fn default() -> Self {
        PageSelection::All
    }
}

fn parse_page(s: &str) -> Result<u32, String> {
    let page: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a page number", s.trim()))?;
    if page == 0 {
        return Err("page numbers start at 1".to_string());
    }
    Ok(page)
}

/// Immutable per-job configuration handed to the executor. Created once at
/// submission and owned exclusively by the worker processing the job.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub job_id: String,
    /// The submitted artifact. Never deleted mid-pipeline; removed exactly
    /// once when the job reaches a terminal state.
    pub input_path: PathBuf,
    /// Permanent result location the final artifact is promoted to.
    pub output_path: PathBuf,
    pub remove_security: bool,
    pub run_ocr: bool,
    pub add_page_numbers: bool,
    pub compress: bool,
    pub dpi: Dpi,
    pub pages: PageSelection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dpi_whitelist() {
        assert_eq!(Dpi::from_value(300), Some(Dpi::Dpi300));
        assert_eq!(Dpi::from_value(600), Some(Dpi::Dpi600));
        assert_eq!(Dpi::from_value(1200), Some(Dpi::Dpi1200));
        assert_eq!(Dpi::from_value(150), None);
        assert_eq!(Dpi::from_value(0), None);
        assert_eq!(Dpi::Dpi1200.as_u32(), 1200);
    }

    #[test]
    fn test_parse_all() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("ALL").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("  ").unwrap(), PageSelection::All);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            PageSelection::parse("3-7").unwrap(),
            PageSelection::Range(3, 7)
        );
        assert!(PageSelection::parse("7-3").is_err());
        assert!(PageSelection::parse("0-3").is_err());
        assert!(PageSelection::parse("a-3").is_err());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            PageSelection::parse("1,3,7").unwrap(),
            PageSelection::List(vec![1, 3, 7])
        );
        assert_eq!(
            PageSelection::parse("4").unwrap(),
            PageSelection::List(vec![4])
        );
        assert!(PageSelection::parse("1,x,7").is_err());
        assert!(PageSelection::parse("1,,7").is_err());
    }

    #[test]
    fn test_tool_args() {
        assert_eq!(PageSelection::All.to_tool_arg(), "all");
        assert_eq!(PageSelection::Range(2, 9).to_tool_arg(), "2-9");
        assert_eq!(
            PageSelection::List(vec![1, 3, 7]).to_tool_arg(),
            "1 3 7"
        );
    }
}
