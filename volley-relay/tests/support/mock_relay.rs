//! Scripted SMTP relay for exercising submission transactions.
//!
//! The relay answers each verb with a configurable reply and records
//! everything it receives, so tests can inject failures at any point
//! of the transaction and assert on the exact command sequence.
#![allow(dead_code)] // Shared test harness; not every test uses every knob.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::Mutex,
    time::timeout,
};

/// A verb the mock relay observed, normalized for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Ehlo(String),
    Auth(String),
    AuthChallengeReply(String),
    MailFrom(String),
    RcptTo(String),
    Data,
    Content(String),
    Quit,
    Other(String),
}

#[derive(Debug, Clone)]
struct Reply {
    code: u16,
    text: String,
}

impl Reply {
    fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    fn render(&self) -> String {
        format!("{} {}\r\n", self.code, self.text)
    }
}

#[derive(Clone)]
struct Script {
    greeting: Reply,
    capabilities: Vec<String>,
    auth: Reply,
    mail_from: Reply,
    rcpt_to: Reply,
    data: Reply,
    data_end: Reply,
    quit: Reply,
    drop_after_commands: Option<usize>,
    hang_on_command: Option<usize>,
    response_delay: Option<Duration>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            greeting: Reply::new(220, "mock relay ready"),
            capabilities: vec!["mock.relay.test".to_string(), "AUTH PLAIN LOGIN".to_string()],
            auth: Reply::new(235, "authentication successful"),
            mail_from: Reply::new(250, "sender ok"),
            rcpt_to: Reply::new(250, "recipient ok"),
            data: Reply::new(354, "end data with <CRLF>.<CRLF>"),
            data_end: Reply::new(250, "message accepted"),
            quit: Reply::new(221, "bye"),
            drop_after_commands: None,
            hang_on_command: None,
            response_delay: None,
        }
    }
}

/// Handle to a running mock relay.
pub struct MockRelay {
    addr: SocketAddr,
    observed: Arc<Mutex<Vec<Observed>>>,
    shutdown: Arc<AtomicBool>,
}

impl MockRelay {
    #[must_use]
    pub fn builder() -> MockRelayBuilder {
        MockRelayBuilder {
            script: Script::default(),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[must_use]
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    pub async fn observed(&self) -> Vec<Observed> {
        self.observed.lock().await.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    async fn serve_client(
        mut stream: TcpStream,
        script: Script,
        observed: Arc<Mutex<Vec<Observed>>>,
    ) -> std::io::Result<()> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        let mut commands = 0usize;
        let mut in_auth_login = false;

        writer.write_all(script.greeting.render().as_bytes()).await?;
        writer.flush().await?;

        loop {
            if script.drop_after_commands.is_some_and(|n| commands >= n) {
                return Ok(());
            }
            if script.hang_on_command.is_some_and(|n| commands == n) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                return Ok(());
            }

            line.clear();
            let read = timeout(Duration::from_secs(10), reader.read_line(&mut line)).await;
            let Ok(Ok(n)) = read else { return Ok(()) };
            if n == 0 {
                return Ok(());
            }

            commands += 1;
            let input = line.trim().to_string();
            let verb = input
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_uppercase();

            if in_auth_login {
                in_auth_login = false;
                observed
                    .lock()
                    .await
                    .push(Observed::AuthChallengeReply(input));
                // Password prompt already answered with the username
                // reply; this is the secret.
                respond(&mut writer, &script, &script.auth.render()).await?;
                continue;
            }

            let (reply, record) = match verb.as_str() {
                "EHLO" => {
                    let domain = input.split_whitespace().nth(1).unwrap_or_default();
                    let mut response = String::new();
                    let last = script.capabilities.len().saturating_sub(1);
                    for (i, capability) in script.capabilities.iter().enumerate() {
                        let sep = if i == last { ' ' } else { '-' };
                        response.push_str(&format!("250{sep}{capability}\r\n"));
                    }
                    (response, Observed::Ehlo(domain.to_string()))
                }
                "AUTH" => {
                    let rest = input[4..].trim().to_string();
                    if rest.to_uppercase().starts_with("LOGIN") {
                        in_auth_login = true;
                        // Single challenge covering both prompts keeps
                        // the script small; the client answers twice.
                        ("334 VXNlcm5hbWU6\r\n".to_string(), Observed::Auth(rest))
                    } else {
                        (script.auth.render(), Observed::Auth(rest))
                    }
                }
                "MAIL" => (
                    script.mail_from.render(),
                    Observed::MailFrom(input[4..].trim().to_string()),
                ),
                "RCPT" => (
                    script.rcpt_to.render(),
                    Observed::RcptTo(input[4..].trim().to_string()),
                ),
                "DATA" => (script.data.render(), Observed::Data),
                "QUIT" => {
                    observed.lock().await.push(Observed::Quit);
                    respond(&mut writer, &script, &script.quit.render()).await?;
                    return Ok(());
                }
                _ => (
                    "500 unrecognized command\r\n".to_string(),
                    Observed::Other(input.clone()),
                ),
            };

            observed.lock().await.push(record.clone());

            if matches!(record, Observed::Data) && script.data.code == 354 {
                respond(&mut writer, &script, &reply).await?;

                let mut content = String::new();
                loop {
                    line.clear();
                    let n = reader.read_line(&mut line).await?;
                    if n == 0 {
                        return Ok(());
                    }
                    if line.trim_end() == "." {
                        break;
                    }
                    content.push_str(&line);
                }
                observed.lock().await.push(Observed::Content(content));
                respond(&mut writer, &script, &script.data_end.render()).await?;
                continue;
            }

            respond(&mut writer, &script, &reply).await?;
        }
    }
}

async fn respond(
    writer: &mut (impl AsyncWriteExt + Unpin),
    script: &Script,
    reply: &str,
) -> std::io::Result<()> {
    if let Some(delay) = script.response_delay {
        tokio::time::sleep(delay).await;
    }
    writer.write_all(reply.as_bytes()).await?;
    writer.flush().await
}

/// Builder configuring the scripted replies.
pub struct MockRelayBuilder {
    script: Script,
}

impl MockRelayBuilder {
    #[must_use]
    pub fn with_greeting(mut self, code: u16, text: impl Into<String>) -> Self {
        self.script.greeting = Reply::new(code, text);
        self
    }

    /// Capability lines after the EHLO identity line.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.script.capabilities = std::iter::once("mock.relay.test")
            .chain(capabilities.iter().copied())
            .map(ToString::to_string)
            .collect();
        self
    }

    #[must_use]
    pub fn with_auth_reply(mut self, code: u16, text: impl Into<String>) -> Self {
        self.script.auth = Reply::new(code, text);
        self
    }

    #[must_use]
    pub fn with_mail_from_reply(mut self, code: u16, text: impl Into<String>) -> Self {
        self.script.mail_from = Reply::new(code, text);
        self
    }

    #[must_use]
    pub fn with_rcpt_to_reply(mut self, code: u16, text: impl Into<String>) -> Self {
        self.script.rcpt_to = Reply::new(code, text);
        self
    }

    #[must_use]
    pub fn with_data_end_reply(mut self, code: u16, text: impl Into<String>) -> Self {
        self.script.data_end = Reply::new(code, text);
        self
    }

    /// Silently drop the connection once `count` commands arrived.
    #[must_use]
    pub const fn with_drop_after_commands(mut self, count: usize) -> Self {
        self.script.drop_after_commands = Some(count);
        self
    }

    /// Stop replying once `count` commands have been handled.
    #[must_use]
    pub const fn with_hang_after_commands(mut self, count: usize) -> Self {
        self.script.hang_on_command = Some(count);
        self
    }

    #[must_use]
    pub const fn with_response_delay(mut self, delay: Duration) -> Self {
        self.script.response_delay = Some(delay);
        self
    }

    /// Binds to an ephemeral port and starts serving.
    pub async fn start(self) -> std::io::Result<MockRelay> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let observed = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let script = self.script;
        let observed_task = Arc::clone(&observed);
        let shutdown_task = Arc::clone(&shutdown);

        tokio::spawn(async move {
            loop {
                if shutdown_task.load(Ordering::Relaxed) {
                    break;
                }

                let accepted = timeout(Duration::from_millis(100), listener.accept()).await;
                if let Ok(Ok((stream, _peer))) = accepted {
                    let script = script.clone();
                    let observed = Arc::clone(&observed_task);
                    tokio::spawn(async move {
                        let _ = MockRelay::serve_client(stream, script, observed).await;
                    });
                }
            }
        });

        Ok(MockRelay {
            addr,
            observed,
            shutdown,
        })
    }
}
