//! Completion email content.

use vgen_models::OwnerId;

/// Rendered completion notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEmail {
    pub subject: String,
    pub html: String,
}

/// Page listing the owner's finished videos.
pub fn results_url(app_url: &str, owner_id: &OwnerId) -> String {
    format!(
        "{}/results/{}",
        app_url.trim_end_matches('/'),
        urlencoding::encode(owner_id.as_str())
    )
}

pub fn completion_email(app_url: &str, subject: &str, owner_id: &OwnerId) -> CompletionEmail {
    let link = results_url(app_url, owner_id);
    let html = format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Your video is ready</title>
    <style>
      body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; }}
      .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
      .content {{ background: #f9fafb; padding: 30px; border-radius: 8px; }}
      .button {{ display: inline-block; background: #9333ea; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 20px 0; }}
      .footer {{ text-align: center; margin-top: 30px; color: #666; font-size: 12px; }}
    </style>
  </head>
  <body>
    <div class="container">
      <h1 style="color: #9333ea; text-align: center;">Your video is ready</h1>
      <div class="content">
        <p>Hello!</p>
        <p>The video you requested has finished rendering. Use the button below to watch it.</p>
        <p style="text-align: center;"><a href="{link}" class="button">View my video</a></p>
        <p style="color: #666; font-size: 14px;">Or open this link in your browser: {link}</p>
      </div>
      <div class="footer">
        <p>Life Is Short</p>
      </div>
    </div>
  </body>
</html>
"#
    );

    CompletionEmail {
        subject: subject.to_string(),
        html,
    }
}
