//! Note text for each emoji event (MFM markup).
//!
//! Absent fields are already rendered as `unknown` by [`EmojiRecord`].

use mk_stream::EmojiRecord;

pub fn format_added(emoji: &EmojiRecord) -> String {
    format_announcement("$[sparkle 🎉] カスタム絵文字が追加されました $[sparkle 🎉]", emoji)
}

pub fn format_updated(emoji: &EmojiRecord) -> String {
    format_announcement("$[jelly 🔄] カスタム絵文字が更新されました $[jelly 🔄]", emoji)
}

/// Deleted emojis can no longer be rendered, so no `:name:` preview
pub fn format_deleted(emoji: &EmojiRecord) -> String {
    format!(
        "<center>$[spin.y 🗑️] カスタム絵文字が削除されました $[spin.y 🗑️]\n\n</center>\n\n\
         名前: `{}` \n\
         カテゴリー: `{}`",
        emoji.name(),
        emoji.category(),
    )
}

fn format_announcement(headline: &str, emoji: &EmojiRecord) -> String {
    let mut text = format!(
        "<center>{headline}\n\n:{name}:</center>\n\n\
         名前: `{name}` \n\
         カテゴリー: `{category}`\n\
         ライセンス: `{license}`\n\
         ローカルのみ: `{local_only}`",
        headline = headline,
        name = emoji.name(),
        category = emoji.category(),
        license = emoji.license(),
        local_only = emoji.local_only(),
    );

    if !emoji.aliases.is_empty() {
        let aliases: Vec<String> = emoji.aliases.iter().map(|a| format!("`{}`", a)).collect();
        text.push_str("\nエイリアス: ");
        text.push_str(&aliases.join(" "));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> EmojiRecord {
        EmojiRecord {
            name: Some("blob".to_string()),
            category: Some("cat".to_string()),
            license: None,
            local_only: Some(true),
            aliases: vec![],
        }
    }

    #[test]
    fn test_format_added() {
        let text = format_added(&blob());
        assert_eq!(
            text,
            "<center>$[sparkle 🎉] カスタム絵文字が追加されました $[sparkle 🎉]\n\n:blob:</center>\n\n\
             名前: `blob` \nカテゴリー: `cat`\nライセンス: `unknown`\nローカルのみ: `true`"
        );
    }

    #[test]
    fn test_format_updated_lists_aliases() {
        let mut emoji = blob();
        emoji.aliases = vec!["blobcat".to_string(), "ぶろぶ".to_string()];

        let text = format_updated(&emoji);
        assert!(text.starts_with("<center>$[jelly 🔄] カスタム絵文字が更新されました"));
        assert!(text.ends_with("ローカルのみ: `true`\nエイリアス: `blobcat` `ぶろぶ`"));
    }

    #[test]
    fn test_format_deleted() {
        let text = format_deleted(&EmojiRecord::default());
        assert_eq!(
            text,
            "<center>$[spin.y 🗑️] カスタム絵文字が削除されました $[spin.y 🗑️]\n\n</center>\n\n\
             名前: `unknown` \nカテゴリー: `unknown`"
        );
    }
}
