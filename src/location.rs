#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParts {
    pub(crate) scheme: String,
    pub(crate) has_authority: bool,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) hostname: String,
    pub(crate) port: String,
    pub(crate) pathname: String,
    pub(crate) opaque_path: String,
    pub(crate) search: String,
    pub(crate) hash: String,
}

impl LocationParts {
    /// Parses an absolute URL. Relative input and malformed authorities yield
    /// `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let scheme_end = trimmed.find(':')?;
        let scheme = trimmed[..scheme_end].to_ascii_lowercase();
        if !is_valid_url_scheme(&scheme) {
            return None;
        }
        let rest = &trimmed[scheme_end + 1..];
        if let Some(without_slashes) = rest.strip_prefix("//") {
            let authority_end = without_slashes
                .find(|ch| ['/', '?', '#'].contains(&ch))
                .unwrap_or(without_slashes.len());
            let authority = &without_slashes[..authority_end];
            let tail = &without_slashes[authority_end..];
            let (username, password, hostname, port) = split_authority_components(authority)?;
            let (pathname, search, hash) = split_path_search_hash(tail);
            let pathname = if pathname.is_empty() {
                "/".to_string()
            } else {
                normalize_pathname(&pathname)
            };
            Some(Self {
                scheme,
                has_authority: true,
                username,
                password,
                hostname,
                port,
                pathname,
                opaque_path: String::new(),
                search,
                hash,
            })
        } else {
            let (opaque_path, search, hash) = split_path_search_hash(rest);
            Some(Self {
                scheme,
                has_authority: false,
                username: String::new(),
                password: String::new(),
                hostname: String::new(),
                port: String::new(),
                pathname: String::new(),
                opaque_path,
                search,
                hash,
            })
        }
    }

    /// Resolves `input` against `self` the way `new URL(input, base)` does for
    /// the shapes a router produces: absolute, scheme-relative, `#hash`,
    /// `?query`, absolute-path and path-relative references.
    pub fn resolve(&self, input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            let mut next = self.clone();
            next.hash.clear();
            return Some(next);
        }

        if looks_absolute(input) {
            return Self::parse(input);
        }

        if input.starts_with("//") {
            return Self::parse(&format!("{}{}", self.protocol(), input));
        }

        if input.contains(char::is_whitespace) {
            return None;
        }

        let mut next = self.clone();
        if input.starts_with('#') {
            next.hash = ensure_hash_prefix(input);
            return Some(next);
        }

        if input.starts_with('?') {
            let (_, search, hash) = split_path_search_hash(input);
            next.search = search;
            next.hash = hash;
            return Some(next);
        }

        let (relative, search, hash) = split_path_search_hash(input);
        if relative.starts_with('/') {
            if next.has_authority {
                next.pathname = normalize_pathname(&relative);
            } else {
                next.opaque_path = relative;
            }
        } else if next.has_authority {
            let base_dir = match next.pathname.rsplit_once('/') {
                Some((prefix, _)) if !prefix.is_empty() => format!("{prefix}/"),
                _ => "/".to_string(),
            };
            next.pathname = normalize_pathname(&format!("{base_dir}{relative}"));
        } else {
            return None;
        }
        next.search = search;
        next.hash = hash;
        Some(next)
    }

    pub fn protocol(&self) -> String {
        format!("{}:", self.scheme)
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn pathname(&self) -> &str {
        if self.has_authority {
            &self.pathname
        } else {
            &self.opaque_path
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn set_hash(&mut self, hash: &str) {
        self.hash = ensure_hash_prefix(hash);
    }

    pub fn host(&self) -> String {
        if self.port.is_empty() {
            self.hostname.clone()
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }

    pub fn origin(&self) -> String {
        if self.has_authority && !self.hostname.is_empty() {
            format!("{}//{}", self.protocol(), self.host())
        } else {
            "null".to_string()
        }
    }

    /// `pathname + search`, the part of the URL a router owns.
    pub fn path_query(&self) -> String {
        format!("{}{}", self.pathname(), self.search)
    }

    pub fn href(&self) -> String {
        if self.has_authority {
            let path = if self.pathname.is_empty() {
                "/"
            } else {
                self.pathname.as_str()
            };
            let credentials = if self.username.is_empty() && self.password.is_empty() {
                String::new()
            } else if self.password.is_empty() {
                format!("{}@", self.username)
            } else {
                format!("{}:{}@", self.username, self.password)
            };
            format!(
                "{}//{}{}{}{}{}",
                self.protocol(),
                credentials,
                self.host(),
                path,
                self.search,
                self.hash
            )
        } else {
            format!(
                "{}{}{}{}",
                self.protocol(),
                self.opaque_path,
                self.search,
                self.hash
            )
        }
    }
}

fn looks_absolute(input: &str) -> bool {
    let Some(scheme_end) = input.find(':') else {
        return false;
    };
    let boundary = input
        .find(|ch| ['/', '?', '#'].contains(&ch))
        .unwrap_or(input.len());
    scheme_end < boundary && is_valid_url_scheme(&input[..scheme_end])
}

pub(crate) fn is_valid_url_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

fn is_valid_hostname(hostname: &str) -> bool {
    if let Some(inner) = hostname.strip_prefix('[') {
        return inner.strip_suffix(']').is_some_and(|addr| {
            !addr.is_empty()
                && addr
                    .chars()
                    .all(|ch| ch.is_ascii_hexdigit() || matches!(ch, ':' | '.'))
        });
    }
    !hostname.chars().any(|ch| {
        ch.is_whitespace() || matches!(ch, '[' | ']' | '<' | '>' | '^' | '|' | '%' | '\\' | '@')
    })
}

fn split_hostname_and_port(authority: &str) -> Option<(String, String)> {
    if authority.is_empty() {
        return Some((String::new(), String::new()));
    }

    let (hostname, port) = if authority.starts_with('[') {
        let end_idx = authority.find(']')?;
        let hostname = &authority[..=end_idx];
        let suffix = &authority[end_idx + 1..];
        match suffix.strip_prefix(':') {
            Some(port) => (hostname, port),
            None if suffix.is_empty() => (hostname, ""),
            None => return None,
        }
    } else {
        match authority.rsplit_once(':') {
            Some((hostname, port)) => (hostname, port),
            None => (authority, ""),
        }
    };

    if !port.chars().all(|ch| ch.is_ascii_digit()) || !is_valid_hostname(hostname) {
        return None;
    }
    Some((hostname.to_ascii_lowercase(), port.to_string()))
}

fn split_authority_components(authority: &str) -> Option<(String, String, String, String)> {
    let (userinfo, hostport) = match authority.rsplit_once('@') {
        Some((userinfo, hostport)) => (userinfo, hostport),
        None => ("", authority),
    };

    let (username, password) = match userinfo.split_once(':') {
        Some((username, password)) => (username.to_string(), password.to_string()),
        None => (userinfo.to_string(), String::new()),
    };

    let (hostname, port) = split_hostname_and_port(hostport)?;
    Some((username, password, hostname, port))
}

pub(crate) fn split_path_search_hash(tail: &str) -> (String, String, String) {
    let mut pathname = tail;
    let mut search = "";
    let mut hash = "";

    if let Some(hash_pos) = tail.find('#') {
        pathname = &tail[..hash_pos];
        hash = &tail[hash_pos..];
    }

    if let Some(search_pos) = pathname.find('?') {
        search = &pathname[search_pos..];
        pathname = &pathname[..search_pos];
    }

    (pathname.to_string(), search.to_string(), hash.to_string())
}

fn normalize_pathname(pathname: &str) -> String {
    let starts_with_slash = pathname.starts_with('/');
    let ends_with_slash = pathname.len() > 1
        && (pathname.ends_with('/') || pathname.ends_with("/.") || pathname.ends_with("/.."));
    let mut parts = Vec::new();
    for segment in pathname.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            parts.pop();
            continue;
        }
        parts.push(segment);
    }
    let mut out = if starts_with_slash {
        format!("/{}", parts.join("/"))
    } else {
        parts.join("/")
    };
    if out.is_empty() {
        out.push('/');
    }
    if ends_with_slash && !out.ends_with('/') {
        out.push('/');
    }
    out
}

fn ensure_hash_prefix(value: &str) -> String {
    if value.is_empty() || value == "#" {
        String::new()
    } else if value.starts_with('#') {
        value.to_string()
    } else {
        format!("#{value}")
    }
}
