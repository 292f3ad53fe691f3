use proptest::prelude::*;
use docent_engine::conductor::{Planner, Recipient, SearchVerdict, Transcript};
use docent_engine::config::Config;
use docent_engine::llm::Message;
use docent_engine::prompts::{
    build_reflection_message, build_reflection_message_for, compose_answer_prompt,
};
use docent_engine::responders::RetrievedContext;

proptest! {
    #[test]
    fn test_config_parsing_round_trip(
        log_level in "error|warn|info|debug|trace",
        search_turns in 1..=10u32,
        writer_turns in 1..=10u32,
        critic_turns in 1..=10u32,
        timeout in 1..=3600u64,
        reflection in any::<bool>(),
        history in 1..=100_000usize,
    ) {
        let mut config = Config::default_config();
        config.core.log_level = log_level;
        config.conversation.search_max_turns = search_turns;
        config.conversation.writer_max_turns = writer_turns;
        config.conversation.critic_max_turns = critic_turns;
        config.conversation.step_timeout_secs = timeout;
        config.conversation.reflection = reflection;
        config.memory.max_history_tokens = history;

        let toml_string = toml::to_string(&config).expect("Failed to serialize config");
        let parsed: Config = toml::from_str(&toml_string).expect("Failed to parse config");

        prop_assert_eq!(parsed.core.log_level, config.core.log_level);
        prop_assert_eq!(parsed.conversation, config.conversation);
        prop_assert_eq!(parsed.memory, config.memory);
    }

    #[test]
    fn test_reply_without_yes_never_searches(reply in "[^y]*") {
        let verdict = SearchVerdict::from_reply(&reply);
        prop_assert_eq!(verdict, SearchVerdict::Sufficient);

        let queue = Planner::default().plan("q", &RetrievedContext::default(), verdict);
        prop_assert_eq!(queue.shape(), vec![Recipient::Writer]);
    }

    #[test]
    fn test_search_precedes_single_writer(
        prefix in ".{0,20}",
        suffix in ".{0,20}",
        question in ".{1,40}",
    ) {
        let reply = format!("{}yes{}", prefix, suffix);
        let verdict = SearchVerdict::from_reply(&reply);
        prop_assert!(verdict.needs_search());

        let queue = Planner::default().plan(&question, &RetrievedContext::default(), verdict);
        prop_assert_eq!(queue.shape(), vec![Recipient::Search, Recipient::Writer]);
        prop_assert_eq!(queue.steps()[0].message.as_fixed(), Some(question.as_str()));
    }

    #[test]
    fn test_answer_prompt_contains_inputs(context in ".{0,200}", question in ".{0,80}") {
        let prompt = compose_answer_prompt(&context, &question);
        prop_assert!(prompt.contains(&context));
        prop_assert!(prompt.contains(&question));
    }

    #[test]
    fn test_reflection_contains_last_message(
        question in "[^\"\n]{1,40}",
        answer in ".{0,200}",
    ) {
        let transcript = Transcript::from(vec![
            Message::user(compose_answer_prompt("ctx", &question)),
            Message::assistant(answer.clone()),
        ]);

        let message = build_reflection_message(&transcript);
        prop_assert!(message.contains(&answer));
        let expected = format!("User: {} \n", question);
        prop_assert!(message.contains(&expected));

        let message = build_reflection_message_for(Some(&question), &transcript);
        prop_assert!(message.contains(&answer));
    }
}
