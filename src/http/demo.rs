//! Static demo page comparing a progressive image with a plain one.

pub const DEMO_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <title>Streaming Image Demo</title>
  </head>
  <body>
    <main>
      <section>
        <h1>Streaming Image Demo</h1>
        <p>A large image delivered in parts with <code>multipart/x-mixed-replace</code>: a small variant first, then the original.</p>

        <img src="/images/icon2.jpg" width="300" height="300" alt="progressively delivered icon"/>
        <img src="/icon2" width="300" height="300" alt="icon delivered as a single response"/>
      </section>
    </main>
  </body>
</html>
"#;
