//! Fuzzy rules compiled into the crate.
//!
//! Each rule coalesces the many URL variants under which a replayable resource is
//! served (tracking parameters, CDN shards, cache busters) onto one canonical path in
//! the `*.fuzzy.replayweb.page` pseudo-domains understood by the replay runtime.
//! Patterns are matched against `host + path + query` of an already normalized path.

use super::{FuzzyRuleSpec, FuzzyRuleTest};

pub(super) struct BuiltinRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replace: &'static str,
    /// `(raw_url, Some(fuzzified))` or `(raw_url, None)` when the rule must not apply
    pub tests: &'static [(&'static str, Option<&'static str>)],
}

impl BuiltinRule {
    pub(super) fn to_spec(&self) -> FuzzyRuleSpec {
        FuzzyRuleSpec {
            name: Some(self.name.to_string()),
            pattern: self.pattern.to_string(),
            replace: self.replace.to_string(),
            tests: self
                .tests
                .iter()
                .map(|(raw_url, fuzzified)| FuzzyRuleTest {
                    raw_url: (*raw_url).to_string(),
                    fuzzified_url: fuzzified.map(str::to_string),
                    unchanged: fuzzified.is_none(),
                })
                .collect(),
        }
    }
}

pub(super) const BUILTIN_RULES: &[BuiltinRule] = &[
    BuiltinRule {
        name: "googlevideo_com",
        pattern: r".*googlevideo.com/(videoplayback(?=\?)).*[?&](id=[^&]+).*",
        replace: r"youtube.fuzzy.replayweb.page/\1?\2",
        tests: &[
            (
                "foobargooglevideo.com/videoplayback?id=1576&key=value",
                Some("youtube.fuzzy.replayweb.page/videoplayback?id=1576"),
            ),
            (
                "foobargooglevideo.com/videoplayback?some=thing&id=1576",
                Some("youtube.fuzzy.replayweb.page/videoplayback?id=1576"),
            ),
            (
                "foobargooglevideo.com/videoplayback?some=thing&id=1576&key=value",
                Some("youtube.fuzzy.replayweb.page/videoplayback?id=1576"),
            ),
            (
                "foobargooglevideo.com/videoplaybackandfoo?some=thing&id=1576&key=value",
                None,
            ),
            (
                "foobargooglevideo.com/videoplayback/?some=thing&id=1576&key=value",
                None,
            ),
        ],
    },
    BuiltinRule {
        name: "youtube_get_video_info",
        pattern: r"(?:www\.)?youtube(?:-nocookie)?\.com/(get_video_info\?).*(video_id=[^&]+).*",
        replace: r"youtube.fuzzy.replayweb.page/\1\2",
        tests: &[
            (
                "www.youtube.com/get_video_info?video_id=123ah",
                Some("youtube.fuzzy.replayweb.page/get_video_info?video_id=123ah"),
            ),
            (
                "www.youtube.com/get_video_info?foo=bar&video_id=123ah&key=value",
                Some("youtube.fuzzy.replayweb.page/get_video_info?video_id=123ah"),
            ),
            (
                "youtube-nocookie.com/get_video_info?video_id=123ah",
                Some("youtube.fuzzy.replayweb.page/get_video_info?video_id=123ah"),
            ),
            ("www.youtube.com/get_video_info?foo=bar", None),
        ],
    },
    BuiltinRule {
        name: "youtube_thumbnails",
        pattern: r"i\.ytimg\.com/vi/(.*?)/.*?\.(\w*?)(?:\?.*|$)",
        replace: r"i.ytimg.com.fuzzy.replayweb.page/vi/\1/thumbnail.\2",
        tests: &[
            (
                "i.ytimg.com/vi/-KpLmsAR23I/maxresdefault.jpg?sqp=-oaymwEmCIAKENAF8quKqQMa8AEB-AH-CYAC0AWKAgwIABABGHIgTyg-MA8=&rs=AOn4CLDr-FmDmP3aCsD84l48ygBmkwHg-g",
                Some("i.ytimg.com.fuzzy.replayweb.page/vi/-KpLmsAR23I/thumbnail.jpg"),
            ),
            (
                "i.ytimg.com/vi/-KpLmsAR23I/maxresdefault.png",
                Some("i.ytimg.com.fuzzy.replayweb.page/vi/-KpLmsAR23I/thumbnail.png"),
            ),
            (
                "i.ytimg.com/vi/-KpLmsAR23I/max.res.default.png",
                Some("i.ytimg.com.fuzzy.replayweb.page/vi/-KpLmsAR23I/thumbnail.png"),
            ),
        ],
    },
    BuiltinRule {
        name: "youtube_embed",
        pattern: r"(?:www\.)?youtube(?:-nocookie)?\.com/embed/([^?]+).*",
        replace: r"youtube.fuzzy.replayweb.page/embed/\1",
        tests: &[
            (
                "www.youtube-nocookie.com/embed/foo",
                Some("youtube.fuzzy.replayweb.page/embed/foo"),
            ),
            (
                "www.youtube-nocookie.com/embed/bar?key=value",
                Some("youtube.fuzzy.replayweb.page/embed/bar"),
            ),
            (
                "youtube.com/embed/foo?key=value",
                Some("youtube.fuzzy.replayweb.page/embed/foo"),
            ),
        ],
    },
    BuiltinRule {
        name: "youtube_youtubei",
        pattern: r"(?:www\.)?youtube(?:-nocookie)?\.com/youtubei/([^?]+).*(videoId[^&]+).*",
        replace: r"youtube.fuzzy.replayweb.page/youtubei/\1?\2",
        tests: &[
            (
                "www.youtube.com/youtubei/v1/foo/baz/things?key=value&other_key=other_value&videoId=xxxx&yet_another_key=yet_another_value",
                Some("youtube.fuzzy.replayweb.page/youtubei/v1/foo/baz/things?videoId=xxxx"),
            ),
            (
                "youtube.com/youtubei/v1/foo/baz/things?videoId=xxxx",
                Some("youtube.fuzzy.replayweb.page/youtubei/v1/foo/baz/things?videoId=xxxx"),
            ),
            ("www.youtube-nocookie.com/youtubei/v1/foo/baz/things?key=value", None),
        ],
    },
    BuiltinRule {
        name: "vimeo_cdn",
        pattern: r".*(?:gcs-vimeo|vod|vod-progressive)\.akamaized\.net.*?/([\d/]+\.mp4)$",
        replace: r"vimeo-cdn.fuzzy.replayweb.page/\1",
        tests: &[
            (
                "vod.akamaized.net/123/456.mp4",
                Some("vimeo-cdn.fuzzy.replayweb.page/123/456.mp4"),
            ),
            (
                "vod-progressive.akamaized.net/abc/123.mp4",
                Some("vimeo-cdn.fuzzy.replayweb.page/123.mp4"),
            ),
            ("foo.akamaized.net/123.mp4", None),
        ],
    },
    BuiltinRule {
        name: "vimeo_player",
        pattern: r".*player\.vimeo\.com/(video/[\d]+)\?.*",
        replace: r"vimeo.fuzzy.replayweb.page/\1",
        tests: &[
            (
                "player.vimeo.com/video/1234?foo=bar",
                Some("vimeo.fuzzy.replayweb.page/video/1234"),
            ),
            ("player.vimeo.com/video/1234", None),
        ],
    },
    BuiltinRule {
        name: "i_vimeocdn_com",
        pattern: r"i\.vimeocdn\.com/(.*)\?.*",
        replace: r"i.vimeocdn.fuzzy.replayweb.page/\1",
        tests: &[
            (
                "i.vimeocdn.com/image/1234?foo=bar",
                Some("i.vimeocdn.fuzzy.replayweb.page/image/1234"),
            ),
            ("i.vimeocdn.com/image/1234", None),
        ],
    },
    BuiltinRule {
        name: "cheatography_com",
        pattern: r"cheatography\.com/scripts/(.*)\.js.*[?&](v=[^&]+).*",
        replace: r"cheatography.com.fuzzy.replayweb.page/scripts/\1.js?\2",
        tests: &[
            (
                "cheatography.com/scripts/useful.min.js?v=2&q=1719438924",
                Some("cheatography.com.fuzzy.replayweb.page/scripts/useful.min.js?v=2"),
            ),
            ("cheatography.com/scripts/foo.js?x=1", None),
        ],
    },
];
