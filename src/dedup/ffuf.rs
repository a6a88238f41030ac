use regex::Regex;

/// Matched words (the `FUZZ` column) from an ffuf CSV result.
///
/// The header row is skipped; rows with fewer than two columns are ignored.
pub fn csv_matches(csv_text: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let mut out = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed ffuf csv row");
                continue;
            }
        };
        if record.len() < 2 {
            continue;
        }
        if let Some(word) = record.get(0).map(str::trim).filter(|w| !w.is_empty()) {
            out.push(word.to_string());
        }
    }
    out
}

/// Absolute `https://<subdomain>/<path>` URLs appearing in raw fuzz output.
pub fn extract_urls(raw: &str, subdomain: &str) -> Vec<String> {
    let pattern = format!(r"https://{}/[a-zA-Z0-9./_-]+", regex::escape(subdomain));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(subdomain, error = %e, "invalid url pattern");
            return Vec::new();
        }
    };
    let mut out: Vec<String> = re.find_iter(raw).map(|m| m.as_str().to_string()).collect();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "FUZZ,url,redirectlocation,position,status_code,content_length,content_words,content_lines,content_type,duration,resultfile,Ffufhash\n\
admin,https://dev.x.com/admin,,1,200,512,10,5,text/html,100ms,,abc\n\
backup.zip,https://dev.x.com/backup.zip,,7,200,4096,1,1,application/zip,80ms,,def\n";

    #[test]
    fn reads_fuzz_column() {
        assert_eq!(csv_matches(SAMPLE), vec!["admin", "backup.zip"]);
        assert!(csv_matches("FUZZ,url\n").is_empty());
        assert!(csv_matches("").is_empty());
    }

    #[test]
    fn extracts_only_urls_for_the_subdomain() {
        let urls = extract_urls(SAMPLE, "dev.x.com");
        assert_eq!(urls, vec!["https://dev.x.com/admin", "https://dev.x.com/backup.zip"]);
        assert!(extract_urls(SAMPLE, "prod.x.com").is_empty());
    }
}
