/// MBS item numbers are opaque strings (e.g. `"23"`, `"2713"`).
pub type MbsCode = String;
