//! Chat transport tests against a local fake IRC server

use std::time::Duration;

use raidclip::chat::TwitchChat;
use raidclip::models::ChatEvent;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

const PRIVMSG: &str = "@badge-info=;badges=broadcaster/1;display-name=Me;user-id=1 :me!me@me.tmi.twitch.tv PRIVMSG #me :?so @someStreamer\r\n";
const RAID: &str = "@badges=;display-name=Raider;login=raider;msg-id=raid;msg-param-displayName=Raider;msg-param-login=raider;msg-param-viewerCount=42 :tmi.twitch.tv USERNOTICE #me\r\n";
const JOIN_NOISE: &str = ":tmi.twitch.tv 001 justinfan12345 :Welcome, GLHF!\r\n";

#[tokio::test]
async fn test_handshake_ping_and_events() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half).lines();

        let mut handshake = Vec::new();
        for _ in 0..4 {
            let line = lines.next_line().await.unwrap().unwrap();
            handshake.push(line.trim_end().to_string());
        }

        write_half.write_all(JOIN_NOISE.as_bytes()).await.unwrap();
        write_half.write_all(b"PING :tmi.twitch.tv\r\n").await.unwrap();
        let pong = lines.next_line().await.unwrap().unwrap();

        write_half.write_all(PRIVMSG.as_bytes()).await.unwrap();
        write_half.write_all(RAID.as_bytes()).await.unwrap();
        write_half.shutdown().await.unwrap();

        (handshake, pong.trim_end().to_string())
    });

    let mut chat = TwitchChat::connect_to(&addr, "#Me").await.unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), chat.events.recv())
        .await
        .unwrap()
        .unwrap();
    match first {
        ChatEvent::Message(message) => {
            assert_eq!(message.channel, "#me");
            assert_eq!(message.sender, "me");
            assert_eq!(message.text, "?so @someStreamer");
            assert!(message.is_broadcaster());
        }
        other => panic!("expected message, got {:?}", other),
    }

    let second = tokio::time::timeout(Duration::from_secs(5), chat.events.recv())
        .await
        .unwrap()
        .unwrap();
    match second {
        ChatEvent::Raid(notice) => {
            assert_eq!(notice.login, "raider");
            assert_eq!(notice.display_name, "Raider");
            assert_eq!(notice.viewer_count, 42);
        }
        other => panic!("expected raid, got {:?}", other),
    }

    // Connection closed by the server ends the stream
    let end = tokio::time::timeout(Duration::from_secs(5), chat.events.recv())
        .await
        .unwrap();
    assert!(end.is_none());

    let (handshake, pong) = server.await.unwrap();
    assert_eq!(handshake[0], "CAP REQ :twitch.tv/tags twitch.tv/commands");
    assert_eq!(handshake[1], "PASS SCHMOOPIIE");
    assert!(handshake[2].starts_with("NICK justinfan"));
    assert_eq!(handshake[3], "JOIN #me");
    assert_eq!(pong, "PONG :tmi.twitch.tv");
}

#[tokio::test]
async fn test_connect_refused() {
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    };

    assert!(TwitchChat::connect_to(&addr, "me").await.is_err());
}
