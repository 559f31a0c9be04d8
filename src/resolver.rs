//! Maps raw link strings onto articles of the link index.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use article::Article;
use index::LinkIndex;

use WikiError;
use WikiErrorKind;
use WikiResult;

const MAX_REDIRECT_HOPS: usize = 8;

/// Canonical lookup key for a title or link target.
///
/// Underscores count as spaces, runs of whitespace collapse to one space and
/// case is folded. The processor keys `original_title.json` with this too.
pub fn normalize_title(title: &str) -> String {
    title
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// Redirect pages resolve to their target article.
    Follow,
    /// Redirect pages are reported as unresolved.
    Unresolved,
}

impl FromStr for RedirectPolicy {
    type Err = WikiError;

    fn from_str(s: &str) -> WikiResult<RedirectPolicy> {
        match s {
            "follow" => Ok(RedirectPolicy::Follow),
            "unresolved" => Ok(RedirectPolicy::Unresolved),
            _ => Err(WikiErrorKind::UnknownPolicy("redirect-policy".to_string(), s.to_string()).into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    NotFound,
    RedirectNotFollowed(String),
    Disambiguation,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Unresolved::NotFound => write!(f, "not found"),
            Unresolved::RedirectNotFollowed(ref target) => write!(f, "redirect to {} not followed", target),
            Unresolved::Disambiguation => write!(f, "disambiguation page"),
        }
    }
}

#[derive(Debug)]
pub enum Resolution<'a> {
    Resolved(&'a Article),
    Unresolved(Unresolved),
}

pub struct Resolver<'a> {
    index: &'a LinkIndex,
    policy: RedirectPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a LinkIndex, policy: RedirectPolicy) -> Resolver<'a> {
        Resolver {
            index: index,
            policy: policy,
        }
    }

    pub fn resolve(&self, link: &str) -> Resolution<'a> {
        if let Some(article) = self.lookup(link) {
            return self.accept(article);
        }
        let mut target = match self.index.redirect(link) {
            Some(target) => target,
            None => return Resolution::Unresolved(Unresolved::NotFound),
        };
        if self.policy == RedirectPolicy::Unresolved {
            return Resolution::Unresolved(Unresolved::RedirectNotFollowed(target.to_string()));
        }
        let mut seen = HashSet::new();
        seen.insert(normalize_title(link));
        for _ in 0..MAX_REDIRECT_HOPS {
            if let Some(article) = self.lookup(target) {
                return self.accept(article);
            }
            if !seen.insert(normalize_title(target)) {
                break;
            }
            target = match self.index.redirect(target) {
                Some(next) => next,
                None => break,
            };
        }
        Resolution::Unresolved(Unresolved::NotFound)
    }

    fn lookup(&self, title: &str) -> Option<&'a Article> {
        let index = self.index;
        index.lookup(title).or_else(|| {
            index
                .original_title(&normalize_title(title))
                .and_then(|original| index.lookup(original))
        })
    }

    fn accept(&self, article: &'a Article) -> Resolution<'a> {
        if article.disambiguation {
            Resolution::Unresolved(Unresolved::Disambiguation)
        } else {
            Resolution::Resolved(article)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::tests::index_of;

    fn titles(res: Resolution) -> Result<String, Unresolved> {
        match res {
            Resolution::Resolved(a) => Ok(a.title.clone()),
            Resolution::Unresolved(u) => Err(u),
        }
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_title("  Absolut_størrelsesklasse "), "absolut størrelsesklasse");
        assert_eq!(normalize_title("Henrietta  Swan\tLeavitt"), "henrietta swan leavitt");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn exact_and_normalized_lookups() {
        let index = index_of(&[("Solen", "Solen er en stjerne.", vec![])], &[]);
        let r = Resolver::new(&index, RedirectPolicy::Follow);
        assert_eq!(titles(r.resolve("Solen")), Ok("Solen".to_string()));
        assert_eq!(titles(r.resolve("solen")), Ok("Solen".to_string()));
        assert_eq!(titles(r.resolve(" SOLEN_")), Ok("Solen".to_string()));
        assert_eq!(titles(r.resolve("Månen")), Err(Unresolved::NotFound));
    }

    #[test]
    fn redirects_follow_policy() {
        let index = index_of(
            &[("Solen", "Solen er en stjerne.", vec![])],
            &[("Sun", "Sol"), ("Sol", "solen"), ("Loop", "Loop2"), ("Loop2", "Loop")],
        );
        let follow = Resolver::new(&index, RedirectPolicy::Follow);
        assert_eq!(titles(follow.resolve("sun")), Ok("Solen".to_string()));
        assert_eq!(titles(follow.resolve("Loop")), Err(Unresolved::NotFound));

        let strict = Resolver::new(&index, RedirectPolicy::Unresolved);
        assert_eq!(
            titles(strict.resolve("Sun")),
            Err(Unresolved::RedirectNotFollowed("Sol".to_string()))
        );
    }

    #[test]
    fn disambiguation_pages_are_unresolved() {
        let index = index_of(
            &[
                ("Mercury", "Mercury may refer to:\n\nMercury (planet)", vec![]),
                ("Jupiter (disambiguation)", "Jupiter is a planet, a god.", vec![]),
            ],
            &[],
        );
        let r = Resolver::new(&index, RedirectPolicy::Follow);
        assert_eq!(titles(r.resolve("Mercury")), Err(Unresolved::Disambiguation));
        assert_eq!(
            titles(r.resolve("Jupiter (Disambiguation)")),
            Err(Unresolved::Disambiguation)
        );
    }

    #[test]
    fn policy_parsing() {
        assert_eq!("follow".parse::<RedirectPolicy>().unwrap(), RedirectPolicy::Follow);
        assert_eq!("unresolved".parse::<RedirectPolicy>().unwrap(), RedirectPolicy::Unresolved);
        assert!("ignore".parse::<RedirectPolicy>().is_err());
    }
}
