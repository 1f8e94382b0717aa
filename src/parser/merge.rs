//! Cross-file merge: fold per-file scans into one corpus.
//!
//! Files are added in manifest order. Keyed tables (classes, bindings,
//! usertypes, aliases) keep the first registration of a name; later
//! duplicates are dropped with a debug log.

use super::binding::BindingScan;
use super::HeaderScan;
use crate::model::*;

#[derive(Debug, Default)]
pub struct CorpusBuilder {
    corpus: Corpus,
    usertype_docs: Vec<(String, Vec<String>)>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_header(&mut self, source: &str, scan: HeaderScan) {
        self.corpus.rpc.extend(scan.rpc);
        for record in scan.classes {
            let name = record.name.clone();
            if !self.corpus.classes.insert_if_absent(name.as_str(), record) {
                tracing::debug!(class = %name, source, "duplicate class record ignored");
            }
        }
    }

    pub fn add_bindings(&mut self, source: &str, scan: BindingScan) {
        for binding in scan.functions {
            let name = binding.script_name.clone();
            if !self.corpus.functions.insert_if_absent(name.as_str(), binding) {
                tracing::debug!(function = %name, source, "duplicate binding ignored");
            }
        }
        self.corpus.events.extend(scan.events);
        self.corpus.casts.extend(scan.casts);
        self.usertype_docs.extend(scan.usertype_docs);
    }

    pub fn add_usertypes(&mut self, source: &str, usertypes: Vec<Usertype>) {
        for usertype in usertypes {
            let name = usertype.script_name.clone();
            if !self.corpus.usertypes.insert_if_absent(name.as_str(), usertype) {
                tracing::debug!(usertype = %name, source, "duplicate usertype ignored");
            }
        }
    }

    pub fn add_libraries(&mut self, libraries: Vec<String>) {
        for lib in libraries {
            if !self.corpus.libraries.contains(&lib) {
                self.corpus.libraries.push(lib);
            }
        }
    }

    pub fn add_aliases(&mut self, aliases: Vec<Alias>) {
        for alias in aliases {
            let name = alias.name.clone();
            self.corpus.aliases.insert_if_absent(name, alias);
        }
    }

    pub fn add_enums(&mut self, enums: Vec<EnumBlock>) {
        self.corpus.enums.extend(enums);
    }

    /// Attach collected usertype docs and return the merged corpus.
    pub fn finish(self) -> Corpus {
        let CorpusBuilder {
            mut corpus,
            usertype_docs,
        } = self;

        for (native, docs) in usertype_docs {
            let target = corpus
                .usertypes
                .values_mut()
                .find(|u| u.native_class == native && u.docs.is_empty());
            if let Some(usertype) = target {
                usertype.docs = docs;
            }
        }

        corpus.casts.sort();
        corpus.casts.dedup();
        corpus
    }
}
