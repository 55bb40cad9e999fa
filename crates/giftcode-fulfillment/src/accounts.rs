use crate::error::FulfillmentError;
use std::path::Path;

/// Ordered list of vendor customer IDs whose saved cards pay for gift cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundingAccounts(Vec<String>);

impl FundingAccounts {
    pub fn new(accounts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(
            accounts
                .into_iter()
                .map(|account| {
                    let account: String = account.into();
                    account.trim().to_owned()
                })
                .filter(|account| !account.is_empty())
                .collect(),
        )
    }

    /// Parses a comma-separated list.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Reads one account per line; blank lines are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FulfillmentError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| FulfillmentError::AccountsFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(contents.lines()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_keeps_order_and_drops_blanks() {
        let accounts = FundingAccounts::from_list(" 414, ,415,416 ,");
        assert_eq!(accounts.iter().collect::<Vec<_>>(), ["414", "415", "416"]);
    }

    #[test]
    fn file_has_one_account_per_line() {
        let path = std::env::temp_dir().join(format!(
            "giftcode-accounts-{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "414\n\n  415\r\n416\n").unwrap();

        let accounts = FundingAccounts::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts.iter().collect::<Vec<_>>(), ["414", "415", "416"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = FundingAccounts::from_file("/nonexistent/giftcode/accounts.txt").unwrap_err();
        assert!(matches!(err, FulfillmentError::AccountsFile { .. }));
    }
}
