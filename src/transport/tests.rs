use super::codec::IrcLineCodec;
use super::connection::{IrcHandle, connect};
use super::message::{IrcCommand, IrcEvent, IrcMessage};
use crate::config::Settings;
use crate::utils::error::IrcError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

fn event(line: &str) -> IrcEvent {
    IrcEvent::from(IrcMessage::parse(line).expect("parse line"))
}

#[test]
fn test_parse_prefix_command_and_trailing() {
    let msg = IrcMessage::parse(":alice!a@example.org PRIVMSG #ops :+#status alert db down\r\n")
        .unwrap();
    assert_eq!(msg.prefix.as_deref(), Some("alice!a@example.org"));
    assert_eq!(msg.command, "PRIVMSG");
    assert_eq!(msg.params, vec!["#ops", "+#status alert db down"]);
    assert_eq!(msg.nick(), Some("alice"));
}

#[test]
fn test_parse_discards_tags_and_handles_no_prefix() {
    let msg = IrcMessage::parse("@time=2024-01-01T00:00:00Z PING :irc.example.net").unwrap();
    assert_eq!(msg.prefix, None);
    assert_eq!(msg.command, "PING");
    assert_eq!(msg.params, vec!["irc.example.net"]);
}

#[test]
fn test_parse_rejects_empty_lines() {
    assert!(IrcMessage::parse("").is_none());
    assert!(IrcMessage::parse(":prefix-only").is_none());
}

#[test]
fn test_map_welcome_ping_and_nick_in_use() {
    assert_eq!(event(":irc.example.net 001 statusbot :Welcome"), IrcEvent::Welcome);
    assert_eq!(
        event(":irc.example.net 433 * statusbot :Nickname is already in use"),
        IrcEvent::NicknameInUse
    );
    assert_eq!(event("PING :abc"), IrcEvent::Ping("abc".into()));
}

#[test]
fn test_map_cap_ack() {
    assert_eq!(
        event(":irc.example.net CAP statusbot ACK :identify-msg"),
        IrcEvent::Cap {
            subcommand: "ACK".into(),
            capabilities: vec!["identify-msg".into()],
        }
    );
}

#[test]
fn test_map_topic_reports() {
    assert_eq!(
        event(":irc.example.net 332 statusbot #ops :All systems go"),
        IrcEvent::TopicReport {
            channel: "#ops".into(),
            topic: "All systems go".into(),
        }
    );
    assert_eq!(
        event(":irc.example.net 331 statusbot #quiet :No topic is set"),
        IrcEvent::TopicReport {
            channel: "#quiet".into(),
            topic: String::new(),
        }
    );
}

#[test]
fn test_map_privmsg() {
    assert_eq!(
        event(":bob!b@host PRIVMSG statusbot :-#status thanks"),
        IrcEvent::Message {
            nick: "bob".into(),
            target: "statusbot".into(),
            text: "-#status thanks".into(),
        }
    );
}

#[test]
fn test_unhandled_commands_pass_through() {
    assert!(matches!(
        event(":alice!a@host JOIN #ops"),
        IrcEvent::Other(IrcMessage { ref command, .. }) if command == "JOIN"
    ));
}

#[test]
fn test_encode_commands() {
    assert_eq!(
        IrcCommand::Topic {
            channel: "#ops".into(),
            topic: None
        }
        .to_line(),
        "TOPIC #ops"
    );
    assert_eq!(
        IrcCommand::Topic {
            channel: "#ops".into(),
            topic: Some("db down".into())
        }
        .to_line(),
        "TOPIC #ops :db down"
    );
    assert_eq!(IrcCommand::CapReq("identify-msg".into()).to_line(), "CAP REQ :identify-msg");
    assert_eq!(
        IrcCommand::User {
            username: "statusbot".into(),
            realname: "statusbot".into()
        }
        .to_line(),
        "USER statusbot 0 * :statusbot"
    );
}

#[test]
fn test_encode_flattens_newlines() {
    let line = IrcCommand::Privmsg {
        target: "#ops".into(),
        text: "one\r\ntwo".into(),
    }
    .to_line();
    assert_eq!(line, "PRIVMSG #ops :one  two");
}

#[test]
fn test_handle_queues_commands() {
    let (handle, mut rx) = IrcHandle::channel();
    handle.privmsg("#ops", "hello").unwrap();
    handle.query_topic("#ops").unwrap();

    assert_eq!(
        rx.try_recv().unwrap(),
        IrcCommand::Privmsg {
            target: "#ops".into(),
            text: "hello".into()
        }
    );
    assert_eq!(
        rx.try_recv().unwrap(),
        IrcCommand::Topic {
            channel: "#ops".into(),
            topic: None
        }
    );
}

#[test]
fn test_handle_reports_closed_connection() {
    let (handle, rx) = IrcHandle::channel();
    drop(rx);
    assert!(matches!(handle.privmsg("#ops", "hello"), Err(IrcError::Closed)));
}

#[test]
fn test_codec_decodes_invalid_utf8_lossily() {
    let mut codec = IrcLineCodec::new(512);
    let mut buf = BytesMut::from(&b":eve!e@h PRIVMSG #ops :caf\xe9\r\nPING :after\r\n"[..]);

    assert_eq!(
        codec.decode(&mut buf).unwrap().as_deref(),
        Some(":eve!e@h PRIVMSG #ops :caf\u{FFFD}")
    );
    assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :after"));
    assert_eq!(codec.decode(&mut buf).unwrap(), None);
}

#[test]
fn test_codec_skips_oversized_lines() {
    let mut codec = IrcLineCodec::new(16);
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&[b'x'; 40]);
    assert_eq!(codec.decode(&mut buf).unwrap(), None);

    // The rest of the long line arrives together with a normal one.
    buf.extend_from_slice(b"xxxx\r\nPING :ok\r\n");
    assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :ok"));
    assert_eq!(codec.decode(&mut buf).unwrap(), None);
}

#[test]
fn test_codec_waits_for_complete_line() {
    let mut codec = IrcLineCodec::new(512);
    let mut buf = BytesMut::from(&b"PING :ab"[..]);
    assert_eq!(codec.decode(&mut buf).unwrap(), None);

    buf.extend_from_slice(b"c\n");
    assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :abc"));
    assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
}

#[test]
fn test_codec_terminates_outbound_lines() {
    let mut codec = IrcLineCodec::new(512);
    let mut buf = BytesMut::new();
    codec.encode("PONG :abc".to_string(), &mut buf).unwrap();
    assert_eq!(&buf[..], b"PONG :abc\r\n");
}

#[tokio::test]
async fn test_connection_survives_undecodable_and_oversized_lines() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket
            .write_all(b":eve!e@h PRIVMSG #ops :caf\xe9\r\n")
            .await
            .unwrap();
        let mut long = vec![b'x'; 9000];
        long.extend_from_slice(b"\r\n");
        socket.write_all(&long).await.unwrap();
        socket.write_all(b"PING :after\r\n").await.unwrap();

        // Keep the connection open until the client goes away.
        let mut buf = [0u8; 1024];
        while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
    });

    let mut settings = Settings::default().irc;
    settings.server = "127.0.0.1".to_string();
    settings.port = port;
    let (_handle, mut events) = connect(&settings).await.unwrap();

    assert_eq!(
        events.recv().await,
        Some(IrcEvent::Message {
            nick: "eve".into(),
            target: "#ops".into(),
            text: "caf\u{FFFD}".into(),
        })
    );
    assert_eq!(events.recv().await, Some(IrcEvent::Ping("after".into())));
}
